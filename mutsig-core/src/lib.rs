//! mutsig-core: shared data structures for mutational signature analysis.
//!
//! - `basis`: the reference signature matrix and the strand-collapsed context lookup
//! - `snv`: SNV and clone-node records, context assignment and transfer
//! - `group`: grouping keys with an explicit branch role
//! - `table`: count matrices and exposure tables

pub mod basis;
pub mod group;
pub mod snv;
pub mod table;

pub use basis::{
    reverse_complement, split_substitution, BasisRow, ContextKey, ContextLookup, MutationContext,
    SignatureBasis, SIGNATURE_PREFIX,
};
pub use group::{BranchRole, GroupKey};
pub use snv::{
    assign_contexts, cohort_contexts, transfer_contexts, AnnotatedNodeSnv, AnnotatedSnv,
    SnvNodeRecord, SnvRecord, VariantSite,
};
pub use table::{CountMatrix, ExposureTable};

/// Number of trinucleotide substitution contexts in the COSMIC basis.
pub const N_COSMIC_CONTEXTS: usize = 96;
