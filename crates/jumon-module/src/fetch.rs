//! Module fetching: local directories and git sparse checkouts.

use crate::module::Module;
use crate::parse;
use async_nats::jetstream::kv::Store;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

pub const MODULE_FILE: &str = "JUMON.md";

#[derive(Debug, Error)]
pub enum FetchModuleError {
    #[error("read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("parse module: {0}")]
    Parse(#[from] parse::ParseError),

    #[error("validate module: {0}")]
    Validate(#[from] crate::module::ModuleValidateError),

    #[error("put module failed: {0}")]
    Put(String),

    #[error("invalid module path: {0}")]
    InvalidPath(String),

    #[error("git {args}: {message}")]
    Git { args: String, message: String },
}

/// Load a module from a local directory and store its raw Markdown.
pub async fn get_by_dir(kv: &Store, dir: &Path) -> Result<Module, FetchModuleError> {
    info!(dir = %dir.display(), "jumon get by dir");

    let data = tokio::fs::read(dir.join(MODULE_FILE)).await?;
    let module = parse::parse_markdown(&data)?;
    module.validate()?;

    kv.put(module.name.clone(), data.into())
        .await
        .map_err(|e| FetchModuleError::Put(e.to_string()))?;

    info!(module = %module.name, "jumon get by dir");
    Ok(module)
}

/// Fetch a module from a git repository via a blob-less sparse checkout.
pub async fn get_by_git(kv: &Store, module: &str) -> Result<Module, FetchModuleError> {
    info!(module = %module, "jumon get by git");

    let (repo, subpath) = vcs_path(module)?;
    let temp = tempfile::tempdir()?;

    let checkout = sparse_checkout(&repo, &subpath, temp.path()).await?;
    debug!(dir = %checkout.display(), "checkout directory");
    get_by_dir(kv, &checkout).await
}

struct VcsPath {
    pattern: &'static str,
    repo: &'static str,
    dir: &'static str,
}

// first rule handles GitHub, the second any two-segment host path
const VCS_PATHS: [VcsPath; 2] = [
    VcsPath {
        pattern: r"^(?P<root>github\.com/[\w.\-]+/[\w.\-]+)(?:/(?P<dir>[\w.\-]+(?:/[\w.\-]+)*))?$",
        repo: "https://{root}",
        dir: "{dir}",
    },
    VcsPath {
        pattern: r"^(?P<root>([a-z0-9.\-]+\.)+[a-z0-9.\-]+(:[0-9]+)?/~?[\w.\-]+/~?[\w.\-]+)(?:/(?P<dir>[\w.\-]+(?:/[\w.\-]+)*))?$",
        repo: "https://{root}",
        dir: "{dir}",
    },
];

fn vcs_regexes() -> &'static Vec<Regex> {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        VCS_PATHS
            .iter()
            .map(|p| Regex::new(p.pattern).unwrap())
            .collect()
    })
}

/// Extract repository URL and subpath from a module path.
pub fn vcs_path(module: &str) -> Result<(String, String), FetchModuleError> {
    for (rule, regex) in VCS_PATHS.iter().zip(vcs_regexes().iter()) {
        let Some(captures) = regex.captures(module) else {
            continue;
        };
        let expand = |template: &str| {
            let mut out = template.to_string();
            for name in ["root", "dir"] {
                let value = captures
                    .name(name)
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                out = out.replace(&format!("{{{name}}}"), value);
            }
            out
        };
        return Ok((expand(rule.repo), expand(rule.dir)));
    }
    Err(FetchModuleError::InvalidPath(module.to_string()))
}

/// Shallow blob-less clone, cone sparse-checkout of `subpath`, checkout.
async fn sparse_checkout(
    repo_url: &str,
    subpath: &str,
    dest: &Path,
) -> Result<PathBuf, FetchModuleError> {
    let dest_str = dest.to_string_lossy().to_string();
    git(
        None,
        &[
            "clone",
            "--depth",
            "1",
            "--filter=blob:none",
            "--no-checkout",
            repo_url,
            &dest_str,
        ],
    )
    .await?;
    git(Some(dest), &["sparse-checkout", "init", "--cone"]).await?;
    git(Some(dest), &["sparse-checkout", "set", subpath]).await?;
    git(Some(dest), &["checkout"]).await?;

    Ok(dest.join(subpath))
}

async fn git(dir: Option<&Path>, args: &[&str]) -> Result<(), FetchModuleError> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }

    let output = command.output().await.map_err(|e| FetchModuleError::Git {
        args: args.join(" "),
        message: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(FetchModuleError::Git {
            args: args.join(" "),
            message: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(())
}
