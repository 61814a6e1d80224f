//! Running a named renderer and normalizing what it returns.
//!
//! The [`Dispatcher`] is the only caller of [`Renderer::render`]. It allocates
//! unique output stubs for image renderers, contains renderer panics, turns
//! renderer errors into text results, and refuses image paths outside the
//! output [`Sandbox`].
//!
//! [`Renderer::render`]: crate::renderer::Renderer::render

use std::{
    panic::{self, AssertUnwindSafe},
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use log::{error, info, warn};
use thiserror::Error;

use expositor_core::request::{OutputKind, RenderRequest, RenderResult};

use crate::{
    invoke::RenderInvoker,
    model::LanguageModel,
    registry::Registry,
    renderer::{RenderContext, RendererOutput},
};

/// Errors the dispatcher reports to its caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown renderer `{0}`")]
    UnknownRenderer(String),

    #[error("invalid output name `{0}`: expected a plain file name stem")]
    InvalidOutputBase(String),

    #[error("image `{}` lies outside the output directory `{}`", .path.display(), .root.display())]
    SandboxViolation {
        path: PathBuf,
        root: PathBuf,
        message: String,
    },
}

/// The directory every image must be written under.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Relative roots are resolved against the current directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root)
            .map(|abs| normalize(&abs))
            .unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh `root/<base>_<8 hex digits>` stub.
    ///
    /// `base` must be a plain file name stem; see [`is_valid_base`].
    pub fn unique_base(&self, base: &str) -> Result<PathBuf, DispatchError> {
        if !is_valid_base(base) {
            return Err(DispatchError::InvalidOutputBase(base.to_string()));
        }
        Ok(self
            .root
            .join(format!("{base}_{:08x}", rand::random::<u32>())))
    }

    /// Check an output stub before anything is written to it.
    pub fn check(&self, path: &Path) -> Result<(), DispatchError> {
        if self.contains(path) {
            return Ok(());
        }
        Err(DispatchError::SandboxViolation {
            path: path.to_path_buf(),
            root: self.root.clone(),
            message: format!(
                "Output path '{}' is outside the allowed directory.",
                path.display()
            ),
        })
    }

    /// Returns `true` if `path` resolves to a location under the root.
    ///
    /// Symlinks are followed for the parts of either path that exist; `..`
    /// components are resolved lexically for the rest.
    pub fn contains(&self, path: &Path) -> bool {
        resolve(path).starts_with(resolve(&self.root))
    }
}

/// Returns `true` if `base` is a single file name: no separators, no `..`,
/// not absolute and not empty.
pub fn is_valid_base(base: &str) -> bool {
    let mut components = Path::new(base).components();
    !base.contains(['/', '\\'])
        && matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
}

fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path)
        .map(|abs| normalize(&abs))
        .unwrap_or_else(|_| normalize(path));

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return tail
                .iter()
                .rev()
                .fold(canonical, |acc, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Runs renderers from a [`Registry`] against one model and one output directory.
pub struct Dispatcher {
    registry: Registry,
    model: Arc<dyn LanguageModel>,
    invoker: RenderInvoker,
    sandbox: Sandbox,
}

impl Dispatcher {
    pub fn new(
        registry: Registry,
        model: Arc<dyn LanguageModel>,
        invoker: RenderInvoker,
        sandbox: Sandbox,
    ) -> Self {
        Self {
            registry,
            model,
            invoker,
            sandbox,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Run the renderer named by `request`.
    ///
    /// Renderer failures and panics come back as text results. Only an
    /// unknown renderer and an image outside the sandbox are errors.
    pub fn dispatch(&self, request: &RenderRequest) -> Result<RenderResult, DispatchError> {
        let name = request.renderer();
        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| DispatchError::UnknownRenderer(name.to_string()))?;

        let output_base = match descriptor.output_kind() {
            OutputKind::Image => {
                let base = match request.output_base() {
                    Some(base) => base.clone(),
                    None => self.sandbox.unique_base(descriptor.output_base())?,
                };
                if let Err(err) = self.sandbox.check(&base) {
                    warn!(
                        renderer = name,
                        path = base.display().to_string();
                        "Output stub lies outside the output directory"
                    );
                    return Err(err);
                }
                Some(base)
            }
            OutputKind::Text => None,
        };

        let ctx = RenderContext {
            request,
            model: self.model.as_ref(),
            invoker: &self.invoker,
            output_base: output_base.as_deref(),
        };
        info!(renderer = name, model = self.model.name(); "Running renderer");

        let renderer = descriptor.renderer();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(&ctx)));

        match outcome {
            Err(_) => {
                error!(renderer = name; "Renderer panicked");
                Ok(RenderResult::text(format!(
                    "Error: An exception occurred while running explainer '{name}'."
                )))
            }
            Ok(Err(err)) => {
                warn!(renderer = name, err = err.to_string(); "Renderer failed");
                Ok(RenderResult::text(err.report(name)))
            }
            Ok(Ok(RendererOutput::Text(content))) => Ok(RenderResult::text(content)),
            Ok(Ok(RendererOutput::Image { path, message })) => {
                if self.sandbox.contains(&path) {
                    info!(renderer = name, path = path.display().to_string(); "Image ready");
                    Ok(RenderResult::image(path, message))
                } else {
                    warn!(
                        renderer = name,
                        path = path.display().to_string(),
                        root = self.sandbox.root().display().to_string();
                        "Renderer wrote outside the output directory"
                    );
                    Err(DispatchError::SandboxViolation {
                        path,
                        root: self.sandbox.root().to_path_buf(),
                        message,
                    })
                }
            }
        }
    }

    /// Like [`Dispatcher::dispatch`], with errors folded into text results.
    pub fn run(&self, request: &RenderRequest) -> RenderResult {
        match self.dispatch(request) {
            Ok(result) => result,
            Err(DispatchError::SandboxViolation { message, .. }) => {
                RenderResult::text(format!("Error processing image path. {message}"))
            }
            Err(
                err @ (DispatchError::UnknownRenderer(_) | DispatchError::InvalidOutputBase(_)),
            ) => RenderResult::text(format!("Error: {err}.")),
        }
    }
}
