//! formfill - Hierarchical form resolution and autofill execution
//!
//! Resolves form controls against a user data record and fills them in two
//! passes: a local fuzzy pass over contextual label hierarchies, then an
//! externally supplied AI action batch for whatever the fuzzy pass left
//! unresolved.
//!
//! ## Pipeline
//! FormTree -> Label Hierarchies -> Match Pool -> Assignments -> Fill
//! -> Ledger -> Snapshot -> (external AI) -> Action Batch -> Ledger
//!
//! ## Quick Start
//!
//! ```rust
//! use formfill::form::builder::FormBuilder;
//! use formfill::record::DataRecord;
//! use formfill::session::AutofillSession;
//! use serde_json::json;
//!
//! let mut b = FormBuilder::new("https://example.test/apply", "Apply");
//! b.open("label");
//! b.attr("for", "email");
//! b.text("Email Address");
//! b.close();
//! b.open("input");
//! b.attr("type", "text");
//! b.attr("id", "email");
//! b.close();
//!
//! let mut session = AutofillSession::new(b.finish());
//! let record = DataRecord::new(json!({"email": "ada@example.test"}));
//! let report = session.run_fuzzy_pass(&record);
//! assert_eq!(report.filled_count, 1);
//! ```

// Core error handling
pub mod error;

// Text folding and tokenization shared by every matching stage
pub mod normalize;
pub mod similarity;

// Matching inputs: alias dictionary, label hierarchies, data record
pub mod alias;
pub mod hierarchy;
pub mod record;

// Resolution: strategy cascade, candidate pool, conflict-free assignment
pub mod assignment;
pub mod matching;

// Execution: type-dispatched fillers over the form model
pub mod fill;
pub mod form;

// Outcomes and the AI round trip
pub mod actions;
pub mod ledger;
pub mod snapshot;

// Pass orchestration
pub mod session;

// Thresholds, tier weights, keyword sets
pub mod config;

// Public re-exports for the common call path
pub use actions::{ActionBatch, ActionInstruction, ActionKind, ActionReport};
pub use alias::AliasTable;
pub use config::MatchConfig;
pub use error::{AutofillError, Result};
pub use form::{builder::FormBuilder, FieldEvent, FormTree};
pub use ledger::{FilledBy, LedgerSummary, TrackingEntry, TrackingLedger};
pub use matching::{MatchCandidate, MatchClass, MatchEngine};
pub use record::DataRecord;
pub use session::{AutofillSession, FillRecord, FuzzyPassReport};
pub use snapshot::FormSnapshot;
