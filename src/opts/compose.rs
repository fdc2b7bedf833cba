use super::store::{sort_fragments, Fragment, OptsStore};
use super::OptsError;
use crate::layout::StagingLayout;
use std::path::{Path, PathBuf};

pub const SCRIPT_NAME: &str = "00_java_opts.sh";

/// Bumped whenever the merge rules in [`SCRIPT_TEMPLATE`] change
pub const SCRIPT_VERSION: u32 = 1;

const DEPS_DIR_TOKEN: &str = "$DEPS_DIR";
const HOME_TOKEN: &str = "$HOME";
const JAVA_OPTS_TOKEN: &str = "$JAVA_OPTS";

/// Values the placeholders resolve to when the application starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeEnv {
    pub deps_dir: String,
    pub home: String,
    pub java_opts: String,
}

impl RuntimeEnv {
    pub fn new(
        deps_dir: impl Into<String>,
        home: impl Into<String>,
        java_opts: impl Into<String>,
    ) -> Self {
        Self {
            deps_dir: deps_dir.into(),
            home: home.into(),
            java_opts: java_opts.into(),
        }
    }

    /// Read `DEPS_DIR`, `HOME` and `JAVA_OPTS` from the process environment.
    /// An unset `HOME` falls back to the account's home directory.
    pub fn from_process() -> Self {
        let var = |key: &str| std::env::var(key).unwrap_or_default();
        let home = std::env::var("HOME").unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default()
        });
        Self::new(var("DEPS_DIR"), home, var("JAVA_OPTS"))
    }
}

/// Merge fragments into the final `JAVA_OPTS` value.
///
/// `env.java_opts` is the pre-existing value, captured before any fragment
/// is applied, so a fragment referencing `$JAVA_OPTS` never sees partial output.
pub fn assemble<'a, I>(fragments: I, env: &RuntimeEnv) -> String
where
    I: IntoIterator<Item = &'a Fragment>,
{
    let mut ordered: Vec<Fragment> = fragments.into_iter().cloned().collect();
    sort_fragments(&mut ordered);

    let mut parts: Vec<String> = Vec::with_capacity(ordered.len());
    for fragment in &ordered {
        let flattened = fragment.content.replace(['\r', '\n'], " ");
        let content = flattened.trim();
        if content.is_empty() {
            continue;
        }
        let content = content
            .replace(DEPS_DIR_TOKEN, &env.deps_dir)
            .replace(HOME_TOKEN, &env.home)
            .replace(JAVA_OPTS_TOKEN, &env.java_opts);
        parts.push(content);
    }

    parts.join(" ").trim().to_string()
}

/// Read every fragment in `dir` and merge them
pub fn compose_dir(dir: &Path, env: &RuntimeEnv) -> Result<String, OptsError> {
    let fragments = OptsStore::new(dir).read_fragments()?;
    Ok(assemble(&fragments, env))
}

// Sourced by bash before the application starts. Mirrors `assemble`:
// C collation keeps `NN_owner` names in (priority, owner) order, each
// fragment is flattened to one line and trimmed, and the placeholders are
// replaced with quoted expansions so `&` or `|` in paths stay literal.
const SCRIPT_TEMPLATE: &str = r#"#!/bin/bash
# javastage java_opts composer v@VERSION@

__javastage_compose_java_opts() {
  local LC_ALL=C
  local opts_dir="$DEPS_DIR/@DEPS_IDX@/java_opts"
  local original_opts="$JAVA_OPTS"
  local composed=""
  local opts_file opts_content

  [ -d "$opts_dir" ] || return 0

  for opts_file in "$opts_dir"/[0-9][0-9]_*.opts; do
    [ -f "$opts_file" ] || continue
    opts_content=$(tr '\r\n' '  ' < "$opts_file" | sed -e 's/^[[:space:]]*//' -e 's/[[:space:]]*$//')
    [ -n "$opts_content" ] || continue
    opts_content="${opts_content//\$DEPS_DIR/"$DEPS_DIR"}"
    opts_content="${opts_content//\$HOME/"$HOME"}"
    opts_content="${opts_content//\$JAVA_OPTS/"$original_opts"}"
    composed="$composed $opts_content"
  done

  composed=$(printf '%s' "$composed" | sed -e 's/^[[:space:]]*//' -e 's/[[:space:]]*$//')
  export JAVA_OPTS="$composed"
}

__javastage_compose_java_opts
unset -f __javastage_compose_java_opts
"#;

/// The profile.d script that composes fragments at application start
#[derive(Debug, Clone)]
pub struct ComposerScript {
    deps_idx: String,
}

impl ComposerScript {
    pub fn new(deps_idx: &str) -> Result<Self, OptsError> {
        if deps_idx.is_empty() || !deps_idx.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OptsError::InvalidDepsIndex(deps_idx.to_string()));
        }
        Ok(Self {
            deps_idx: deps_idx.to_string(),
        })
    }

    pub fn render(&self) -> String {
        SCRIPT_TEMPLATE
            .replace("@VERSION@", &SCRIPT_VERSION.to_string())
            .replace("@DEPS_IDX@", &self.deps_idx)
    }

    /// Write the script into the layout's profile.d directory
    pub fn install(&self, layout: &StagingLayout) -> Result<PathBuf, OptsError> {
        layout
            .write_profile_d(SCRIPT_NAME, &self.render())
            .map_err(|e| OptsError::io(layout.profile_d_dir().join(SCRIPT_NAME), e))
    }
}
