//! The `loadmix` load generator.
//!
//! See the [`loadmix`] library for an overview.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    loadmix::cli::execute()
}
