use std::{collections::HashMap, sync::Arc};

use uguid::Guid;

use crate::{
    demystify::{show_in_stack_trace, Demystifier, MetadataProvider},
    stacktrace::{StackFrameInformation, StackTraceInformation},
    symbols::{DebugMeta, SymbolOptions, SymbolReaderCache},
    Error, Result,
};

/// Fills in source locations and method names of captured stack traces.
///
/// Source locations come from portable PDBs found through a [`SymbolReaderCache`]; the cache
/// can be shared between symbolicators. Method names come from the [`MetadataProvider`]s
/// registered per module with [`Symbolicator::with_module`], and only for frames that were
/// captured without one.
///
/// Symbolication is best effort. A frame whose symbols cannot be found keeps its captured
/// fields; fields that were already set are never overwritten.
///
/// # Examples
///
/// ```rust,no_run
/// use dotsym::{
///     metadata::cilmodule::CilModule,
///     stacktrace::{StackFrameInformation, StackTraceInformation, Symbolicator},
///     symbols::SymbolOptions,
/// };
/// use std::{path::Path, sync::Arc};
///
/// let module = Arc::new(CilModule::from_file(Path::new("App.dll"))?);
/// let mvid = module.mvid()?;
///
/// let mut trace = StackTraceInformation::empty();
/// trace.push(
///     StackFrameInformation::new(mvid, 0x0600_0003, 0x1A, true),
///     module.debug_meta()?.as_ref(),
/// );
///
/// let symbolicator = Symbolicator::new(SymbolOptions::server("/srv/symbols"))
///     .with_module(mvid, module);
/// symbolicator.symbolicate(&mut trace);
/// print!("{trace}");
/// # Ok::<(), dotsym::Error>(())
/// ```
pub struct Symbolicator {
    cache: Arc<SymbolReaderCache>,
    modules: HashMap<Guid, Arc<dyn MetadataProvider>>,
}

impl Symbolicator {
    /// Creates a symbolicator with its own symbol cache.
    #[must_use]
    pub fn new(options: SymbolOptions) -> Self {
        Self::with_cache(Arc::new(SymbolReaderCache::new(options)))
    }

    /// Creates a symbolicator on a shared symbol cache.
    #[must_use]
    pub fn with_cache(cache: Arc<SymbolReaderCache>) -> Self {
        Symbolicator {
            cache,
            modules: HashMap::new(),
        }
    }

    /// Registers the metadata of module `module_id`.
    #[must_use]
    pub fn with_module(mut self, module_id: Guid, provider: Arc<dyn MetadataProvider>) -> Self {
        self.modules.insert(module_id, provider);
        self
    }

    /// The symbol cache in use.
    #[must_use]
    pub fn cache(&self) -> &Arc<SymbolReaderCache> {
        &self.cache
    }

    /// Symbolicates every frame of `trace` in place.
    ///
    /// Frames without a line number are resolved through the debug meta of their module.
    /// Frames without a method name are named through the module's registered provider, unless
    /// the provider marks the method hidden; the last frame is always named.
    ///
    /// Returns the symbol file failures met on the way, one per module. They do not stop the
    /// remaining frames from being processed. Debug metas of modules left without unresolved
    /// frames are dropped afterwards.
    pub fn symbolicate(&self, trace: &mut StackTraceInformation) -> Vec<Error> {
        let mut failures = Vec::new();
        let mut failed_modules = Vec::new();
        let last = trace.frames.len().saturating_sub(1);

        for index in 0..trace.frames.len() {
            let frame = &trace.frames[index];
            let mut resolved = None;

            if frame.needs_symbols() {
                let meta = frame.mvid.and_then(|mvid| trace.debug_metas.get(&mvid));
                if let Some(meta) = meta {
                    match self.try_symbolicate_frame(frame, meta) {
                        Ok(frame) => resolved = Some(frame),
                        Err(error) => {
                            if !failed_modules.contains(&meta.module_id) {
                                failed_modules.push(meta.module_id);
                                failures.push(error);
                            }
                        }
                    }
                }
            }

            let named = self.demystify(resolved.as_ref().unwrap_or(frame), index == last);
            if let Some(frame) = named.or(resolved) {
                trace.frames[index] = frame;
            }
        }

        trace.prune_debug_metas();
        failures
    }

    /// Returns `frame` with its source location filled in from the symbols of `meta`.
    ///
    /// Returns an unchanged copy when the frame already has a line, lacks a method token or
    /// offset, or the symbols have nothing for it. Symbol file failures are logged.
    #[must_use]
    pub fn symbolicate_frame(&self, frame: &StackFrameInformation, meta: &DebugMeta) -> StackFrameInformation {
        match self.try_symbolicate_frame(frame, meta) {
            Ok(frame) => frame,
            Err(error) => {
                log::warn!("Symbolication of module {} failed: {}", meta.module_id, error);
                frame.clone()
            }
        }
    }

    /// Like [`Symbolicator::symbolicate_frame`], but reports symbol file failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the module's symbol file exists but cannot be read.
    pub fn try_symbolicate_frame(
        &self,
        frame: &StackFrameInformation,
        meta: &DebugMeta,
    ) -> Result<StackFrameInformation> {
        if !frame.needs_symbols() {
            return Ok(frame.clone());
        }

        let (Some(method), Some(offset)) = (frame.method_token(), frame.offset) else {
            return Ok(frame.clone());
        };

        // Sequence points map IL offsets only
        if frame.is_native_offset() {
            log::debug!("Frame of method {} has a native offset, not symbolicated", method);
            return Ok(frame.clone());
        }

        let Some(pdb) = self.cache.get(meta)? else {
            return Ok(frame.clone());
        };

        let location = pdb.resolve(method, offset).map_err(|error| Error::SymbolFile {
            module_id: meta.module_id,
            source: Arc::new(error),
        })?;

        Ok(match location {
            Some(location) => frame.with_location(location.file, location.line, location.column),
            None => {
                log::debug!(
                    "No sequence point for method {} at offset {} in module {}",
                    method,
                    offset,
                    meta.module_id
                );
                frame.clone()
            }
        })
    }

    /// Names a frame captured without method name through its module's provider.
    ///
    /// Returns `None` when there is nothing to add, or when the method is hidden and
    /// `keep_hidden` is not set.
    fn demystify(&self, frame: &StackFrameInformation, keep_hidden: bool) -> Option<StackFrameInformation> {
        if frame.method.is_some() {
            return None;
        }

        let provider = self.modules.get(&frame.mvid?)?;
        let method = frame.method_token()?;

        if !keep_hidden && !show_in_stack_trace(provider.as_ref(), method) {
            log::trace!("Method {} is hidden from stack traces", method);
            return None;
        }

        let resolved = Demystifier::new(provider.as_ref()).resolve(method)?;

        let mut named = frame.clone();
        named.method = Some(resolved.to_string());
        if named.type_full_name.is_none() {
            named.type_full_name = resolved
                .declaring_type_full_name()
                .map(|name| name.replace('+', "."));
        }
        if named.parameters.is_none() {
            named.parameters = Some(resolved.parameters.iter().map(ToString::to_string).collect());
        }
        if named.generic_arguments.is_none() && !resolved.generic_arguments.is_empty() {
            named.generic_arguments = Some(resolved.generic_arguments.clone());
        }

        Some(named)
    }
}
