//! `doxy-authority`: the version-indexed catalog of per-symbol API
//! specifications that the rest of `doxy` joins call sites against.
//!
//! This crate owns the data model ("ApiSpec",
//! "ResolvedApiSpec") and the authority store's loading/query contract. It has no
//! knowledge of source files, imports, or findings — those live in the
//! `doxy` crate, which depends on this one the way `foundry-compilers`
//! depends on its separate artifacts crate for the Solidity data model.

pub mod error;
pub mod semver_ext;
pub mod spec;
pub mod store;

pub use error::{AuthorityError, Result};
pub use semver_ext::VersionRange;
pub use spec::{ApiSpec, DeprecationEntry, ParamDescriptor, ReplacementRef, ResolvedApiSpec, SignatureSpec, SymbolKind};
pub use store::{AuthorityStore, Manifest, ManifestPackageEntry};
