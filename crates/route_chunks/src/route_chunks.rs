use std::sync::Arc;

use anyhow::{bail, Result};
use memo_cache::MemoCache;
use serde::Serialize;
use swc_utils::PrintOptions;

use crate::chunkable::is_chunkable;
use crate::emit::{chunked_export_module, omit_chunked_exports};
use crate::parse::{analyze_exports, ExportName, ModuleExportGraph};

/// Exports that may be split out of a route module into their own chunks.
pub const CHUNKABLE_EXPORTS: [&str; 2] = ["clientAction", "clientLoader"];

/// Name of the residual module once chunkable exports are split away.
pub const MAIN_CHUNK_NAME: &str = "main";

/// Chunkability verdicts for one route module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouteChunkFlags {
    pub has_client_action: bool,
    pub has_client_loader: bool,
    pub has_route_chunks: bool,
}

/// Caching front end over the analyzer and emitters.
///
/// Cache keys are the caller's opaque key (typically a file path) suffixed
/// with the operation and its parameters; the exact source text is the
/// fingerprint, so any edit invalidates every derived artifact on the next
/// call. Printer options participate in emitter keys only, since they
/// cannot change the dependency analysis.
#[derive(Debug, Default)]
pub struct RouteChunker {
    analysis: MemoCache<Arc<ModuleExportGraph>>,
    flags: MemoCache<RouteChunkFlags>,
    code: MemoCache<Option<String>>,
}

impl RouteChunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached dependency analysis for one `(cache_key, source)` pair.
    pub fn export_graph(&self, cache_key: &str, source: &str) -> Result<Arc<ModuleExportGraph>> {
        self.analysis.get_or_try_insert(
            &format!("{cache_key}::exportDependencies"),
            source,
            || analyze_exports(source).map(Arc::new),
        )
    }

    pub fn is_chunkable_export(
        &self,
        cache_key: &str,
        source: &str,
        name: &ExportName,
    ) -> Result<bool> {
        let graph = self.export_graph(cache_key, source)?;
        Ok(is_chunkable(&graph, name))
    }

    /// One flag per chunkable export name, plus their disjunction.
    pub fn detect_route_chunks(&self, cache_key: &str, source: &str) -> Result<RouteChunkFlags> {
        self.flags
            .get_or_try_insert(&format!("{cache_key}::detectRouteChunks"), source, || {
                let graph = self.export_graph(cache_key, source)?;
                let has_client_action =
                    is_chunkable(&graph, &ExportName::named(CHUNKABLE_EXPORTS[0]));
                let has_client_loader =
                    is_chunkable(&graph, &ExportName::named(CHUNKABLE_EXPORTS[1]));
                Ok(RouteChunkFlags {
                    has_client_action,
                    has_client_loader,
                    has_route_chunks: has_client_action || has_client_loader,
                })
            })
    }

    pub fn is_route_chunk_name(name: &str) -> bool {
        name == MAIN_CHUNK_NAME || CHUNKABLE_EXPORTS.contains(&name)
    }

    /// Cached chunk emission for one export.
    pub fn chunked_export(
        &self,
        cache_key: &str,
        source: &str,
        name: &ExportName,
        options: &PrintOptions,
    ) -> Result<Option<String>> {
        let key = format!(
            "{cache_key}::getChunkedExport::{name}::{}",
            options.cache_component()
        );
        self.code.get_or_try_insert(&key, source, || {
            let graph = self.export_graph(cache_key, source)?;
            chunked_export_module(&graph, name, source, options)
        })
    }

    /// Cached main-module emission with `names` split away.
    pub fn main_module(
        &self,
        cache_key: &str,
        source: &str,
        names: &[ExportName],
        options: &PrintOptions,
    ) -> Result<Option<String>> {
        let joined = names
            .iter()
            .map(ExportName::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let key = format!(
            "{cache_key}::omitChunkedExports::{joined}::{}",
            options.cache_component()
        );
        self.code.get_or_try_insert(&key, source, || {
            let graph = self.export_graph(cache_key, source)?;
            omit_chunked_exports(&graph, names, source, options)
        })
    }

    /// Dispatches one name from the closed chunk-name set to the matching
    /// emitter.
    pub fn route_chunk(
        &self,
        cache_key: &str,
        source: &str,
        chunk_name: &str,
        options: &PrintOptions,
    ) -> Result<Option<String>> {
        if chunk_name == MAIN_CHUNK_NAME {
            let names: Vec<ExportName> = CHUNKABLE_EXPORTS
                .iter()
                .map(|name| ExportName::named(*name))
                .collect();
            return self.main_module(cache_key, source, &names, options);
        }
        if CHUNKABLE_EXPORTS.contains(&chunk_name) {
            return self.chunked_export(cache_key, source, &ExportName::named(chunk_name), options);
        }
        bail!("unknown route chunk name: {chunk_name}");
    }

    /// Clears every artifact derived from `cache_key`.
    pub fn invalidate(&self, cache_key: &str) {
        let prefix = format!("{cache_key}::");
        self.analysis.invalidate_prefix(&prefix);
        self.flags.invalidate_prefix(&prefix);
        self.code.invalidate_prefix(&prefix);
    }
}
