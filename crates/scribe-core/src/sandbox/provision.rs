use std::fs;
use std::path::Path;

use git2::{Repository, RepositoryInitOptions, Signature};

use crate::config::SessionSettings;
use crate::error::CoreError;
use crate::model::LogicalClock;

use super::session::{Sandbox, SandboxLayout};
use super::{FAKE_FORK_DIR, FAKE_REMOTE_DIR, HOME_DIR, WORKING_DIR};

/// Files GitHub puts into a new repository, in commit order.
pub const SEED_FILES: &[&str] = &["README.md", "LICENSE", ".gitignore"];

/// Build a fresh sandbox: the fictitious remote with its initial commit,
/// the fork source when a fork URL is configured, an empty working tree
/// and an empty home directory.
///
/// Any failure aborts: later commands assume the complete starting state.
pub fn provision(settings: &SessionSettings) -> Result<Sandbox, CoreError> {
    settings.validate()?;

    let root = tempfile::Builder::new()
        .prefix("scribe-")
        .tempdir()
        .map_err(|e| CoreError::Provision(format!("Failed to create sandbox root: {e}")))?;
    let mut clock = LogicalClock::new(
        settings.clock_start,
        settings.clock_step,
        settings.utc_offset_minutes,
    )?;
    let name = settings.repo_name();

    let remote = root.path().join(FAKE_REMOTE_DIR).join(name);
    create_remote(&remote, settings, &mut clock)
        .map_err(|e| CoreError::Provision(format!("Failed to create fictitious remote: {e}")))?;

    let fork = match &settings.fork_url {
        Some(_) => {
            let dir = root.path().join(FAKE_FORK_DIR).join(name);
            create_fork_source(&remote, &dir, settings, &mut clock)
                .map_err(|e| CoreError::Provision(format!("Failed to create fork source: {e}")))?;
            Some(dir)
        }
        None => None,
    };

    let working_root = root.path().join(WORKING_DIR);
    let home = root.path().join(HOME_DIR);
    fs::create_dir(&working_root)
        .and_then(|()| fs::create_dir(&home))
        .map_err(|e| CoreError::Provision(format!("Failed to create working tree: {e}")))?;

    tracing::info!("Provisioned sandbox at {}", root.path().display());
    let layout = SandboxLayout {
        root,
        working_root,
        home,
        remote,
        fork,
    };
    Ok(Sandbox::new(layout, name, settings.git_config.clone(), clock))
}

fn create_remote(
    dir: &Path,
    settings: &SessionSettings,
    clock: &mut LogicalClock,
) -> Result<(), CoreError> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join("README.md"), settings.seed_readme())?;
    fs::write(dir.join("LICENSE"), "")?;
    fs::write(dir.join(".gitignore"), "")?;

    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(&settings.default_branch);
    let repo = Repository::init_opts(dir, &opts)?;

    let mut config = repo.config()?;
    config.set_str("user.email", &settings.seed_author_email)?;
    config.set_str("user.name", &settings.seed_author_name)?;
    // Lets clones push to the checked-out branch of a non-bare repository.
    config.set_str("receive.denyCurrentBranch", "ignore")?;

    let mut index = repo.index()?;
    for file in SEED_FILES {
        index.add_path(Path::new(file))?;
    }
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;

    clock.tick();
    let sig = Signature::new(
        &settings.seed_author_name,
        &settings.seed_author_email,
        &clock.git_time(),
    )?;
    let oid = repo.commit(
        Some("HEAD"),
        &sig,
        &sig,
        &settings.initial_commit_message,
        &tree,
        &[],
    )?;
    tracing::debug!("Fictitious remote initial commit {oid}");
    Ok(())
}

/// The fork source starts as a copy of the remote and then gains a commit
/// of its own, so pulling from it brings in history the remote lacks.
fn create_fork_source(
    remote: &Path,
    dir: &Path,
    settings: &SessionSettings,
    clock: &mut LogicalClock,
) -> Result<(), CoreError> {
    if let Some(parent) = dir.parent() {
        fs::create_dir_all(parent)?;
    }
    let repo = Repository::clone(&remote.to_string_lossy(), dir)?;

    let readme = dir.join("README.md");
    let mut content = fs::read_to_string(&readme)?;
    content.push_str(&settings.fork_readme_addition);
    fs::write(&readme, content)?;

    let mut index = repo.index()?;
    index.add_path(Path::new("README.md"))?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;
    let parent = repo.head()?.peel_to_commit()?;

    clock.tick();
    let sig = Signature::new(
        &settings.seed_author_name,
        &settings.seed_author_email,
        &clock.git_time(),
    )?;
    let oid = repo.commit(
        Some("HEAD"),
        &sig,
        &sig,
        &settings.fork_commit_message,
        &tree,
        &[&parent],
    )?;
    tracing::debug!("Fork source commit {oid}");
    Ok(())
}
