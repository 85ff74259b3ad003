use std::path::{Path, PathBuf};
use std::{env, fs, io};

use crate::ast::ParserOptions;
use crate::module::ScriptModuleLoader;

/// File access used when an input turns out to be a path.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
    fn read_text(&self, path: &Path) -> io::Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Where and how string inputs are resolved.
#[derive(Debug, Clone)]
pub struct Context<F = LocalFileSystem, L = ScriptModuleLoader> {
    pub cwd: PathBuf,
    pub fs: F,
    pub module_loader: L,
    pub parser_options: ParserOptions,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cwd: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            fs: LocalFileSystem,
            module_loader: ScriptModuleLoader,
            parser_options: ParserOptions::default(),
        }
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F, L> Context<F, L> {
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn with_parser_options(mut self, parser_options: ParserOptions) -> Self {
        self.parser_options = parser_options;
        self
    }

    pub fn with_fs<G>(self, fs: G) -> Context<G, L> {
        Context {
            cwd: self.cwd,
            fs,
            module_loader: self.module_loader,
            parser_options: self.parser_options,
        }
    }

    pub fn with_module_loader<M>(self, module_loader: M) -> Context<F, M> {
        Context {
            cwd: self.cwd,
            fs: self.fs,
            module_loader,
            parser_options: self.parser_options,
        }
    }

    /// `path` relative to the working directory. Absolute paths are kept.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        self.cwd.join(path)
    }
}
