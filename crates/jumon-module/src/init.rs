//! Starter module scaffolding.

use std::io::Write;
use thiserror::Error;

const INIT_TEMPLATE: &str = "\
---
module: {name}
---
#

## Scripts

### main

## Tools

";

#[derive(Debug, Error)]
pub enum InitError {
    #[error("JUMON.md already exists")]
    AlreadyExists,

    #[error("write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Write a starter `JUMON.md` in the current directory.
pub fn init_module(name: &str) -> Result<(), InitError> {
    let path = std::path::Path::new(crate::fetch::MODULE_FILE);
    if path.exists() {
        return Err(InitError::AlreadyExists);
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(INIT_TEMPLATE.replace("{name}", name).as_bytes())?;
    Ok(())
}
