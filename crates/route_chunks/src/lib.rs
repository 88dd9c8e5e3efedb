mod chunkable;
mod emit;
pub mod parse;
mod route_chunks;

pub use chunkable::is_chunkable;
pub use emit::{chunked_export_module, omit_chunked_exports};
pub use parse::{analyze_exports, ExportDeps, ExportName, ModuleExportGraph};
pub use route_chunks::{RouteChunkFlags, RouteChunker, CHUNKABLE_EXPORTS, MAIN_CHUNK_NAME};
