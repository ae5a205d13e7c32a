//! The registry cache's only collaborator for talking to git (`spec §1`
//! "out of scope: … the git fetcher" — meaning its *implementation*, not the
//! narrow interface the cache drives it through).
//!
//! [`GitFetcher`] clones a registry source at a given ref into a local
//! directory and reports the resolved SHA, which the cache then treats as
//! `local_ref` (`spec §3` "Registry").

use camino::{Utf8Path, Utf8PathBuf};

/// A registry source resolved to an on-disk tree, at whatever ref was asked
/// for (`latest` meaning "the source's default branch tip").
#[derive(Debug, Clone)]
pub struct ClonedRepo {
    pub root: Utf8PathBuf,
    /// The full SHA of the commit actually checked out.
    pub head_sha: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to clone {url}: {source}")]
    Clone { url: String, source: git2::Error },
    #[error("ref {ref_name:?} not found in {url}")]
    RefNotFound { url: String, ref_name: String },
    #[error(transparent)]
    Git(#[from] git2::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Optional basic-auth credentials for a private registry source
/// (`spec §4.1` "Add" opts `username`/`password`).
#[derive(Debug, Clone, Default)]
pub struct GitCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl GitCredentials {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

/// The narrow capability the registry cache needs from git: clone a source
/// at a ref into an empty destination directory.
///
/// Kept as a trait so tests can substitute a fixture-backed fetcher instead
/// of reaching out to a real remote (`pack-fixture` provides one).
pub trait GitFetcher: Send + Sync {
    fn clone_ref(
        &self,
        url: &str,
        ref_name: &str,
        dest: &Utf8Path,
        credentials: &GitCredentials,
    ) -> Result<ClonedRepo, GitError>;
}

/// The real implementation, backed by `git2`/libgit2.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Fetcher;

impl GitFetcher for Git2Fetcher {
    fn clone_ref(
        &self,
        url: &str,
        ref_name: &str,
        dest: &Utf8Path,
        credentials: &GitCredentials,
    ) -> Result<ClonedRepo, GitError> {
        tracing::debug!(url, ref_name, dest = %dest, "cloning git source");

        let mut callbacks = git2::RemoteCallbacks::new();
        if !credentials.is_empty() {
            let username = credentials.username.clone().unwrap_or_default();
            let password = credentials.password.clone().unwrap_or_default();
            callbacks.credentials(move |_url, _username_from_url, _allowed| {
                git2::Cred::userpass_plaintext(&username, &password)
            });
        }
        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let repo = git2::build::RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, dest.as_std_path())
            .map_err(|source| GitError::Clone {
                url: url.to_string(),
                source,
            })?;

        if ref_name != "latest" {
            checkout_ref(&repo, url, ref_name)?;
        }

        let head_sha = repo.head()?.peel_to_commit()?.id().to_string();

        Ok(ClonedRepo {
            root: dest.to_path_buf(),
            head_sha,
        })
    }
}

/// Resolves `ref_name` to a commit (tag, branch, or SHA prefix) and checks
/// out the working tree to match, detaching `HEAD`.
fn checkout_ref(repo: &git2::Repository, url: &str, ref_name: &str) -> Result<(), GitError> {
    let object = repo
        .revparse_single(ref_name)
        .or_else(|_| repo.revparse_single(&format!("origin/{ref_name}")))
        .map_err(|_| GitError::RefNotFound {
            url: url.to_string(),
            ref_name: ref_name.to_string(),
        })?;

    let commit = object.peel_to_commit()?;
    repo.checkout_tree(commit.as_object(), None)?;
    repo.set_head_detached(commit.id())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_error_mentions_the_url() {
        let err = GitError::Clone {
            url: "https://example.invalid/repo.git".to_string(),
            source: git2::Error::from_str("boom"),
        };
        assert!(err.to_string().contains("example.invalid"));
    }

    #[test]
    fn ref_not_found_mentions_both_fields() {
        let err = GitError::RefNotFound {
            url: "https://example.invalid/repo.git".to_string(),
            ref_name: "v9.9.9".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("v9.9.9"));
        assert!(msg.contains("example.invalid"));
    }
}
