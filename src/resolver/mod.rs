//! Open-access PDF resolution for DOI inputs.
//!
//! DOIs cannot be fetched directly; they are resolved through a third-party
//! open-access API into a direct PDF URL, which then feeds the candidate
//! supplier. The download pipeline itself never calls a resolver.

mod unpaywall;

pub use unpaywall::{ResolveError, UnpaywallResolver};
