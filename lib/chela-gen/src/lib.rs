//! Interface analysis and emission for the chela declarative HTTP-client
//! generator.
//!
//! The pipeline is linear, leaves-first:
//!
//! 1. A [`TypeModel`] describes one annotated service interface. It is
//!    produced by a collaborator (a macro, a static analyzer, or a
//!    hand-authored descriptor) and consumed here as-is.
//! 2. [`Diagnostics`] accumulates validation findings; nothing aborts, so
//!    one pass surfaces every reachable finding.
//! 3. [`SerializationResolver`] resolves effective serialization methods by
//!    precedence: call-site override, method default, type default,
//!    framework default.
//! 4. The [`validate`] functions enforce the structural rules.
//! 5. An [`Emitter`] backend records emission operations per type and per
//!    method: [`PlanEmitter`] materializes an executable [`ClientPlan`],
//!    [`SourceEmitter`] renders Rust source text.
//! 6. [`generate`] orchestrates the pass.
//!
//! # Example
//!
//! ```
//! use chela_core::Method;
//! use chela_gen::model::{MethodModel, RequestAttr, ReturnType, TypeModel};
//! use chela_gen::{PlanEmitter, generate};
//!
//! let model = TypeModel::new("UserApi").with_method(MethodModel::new(
//!     "list_users",
//!     RequestAttr::new(Method::Get, "/users"),
//!     ReturnType::FutureVoid,
//! ));
//! let plan = generate(&model, &PlanEmitter).into_result().expect("valid");
//! assert_eq!(plan.methods().len(), 1);
//! ```

mod diagnostics;
mod emit;
mod generate;
pub mod model;
mod plan;
mod resolve;
mod source;
pub mod validate;

pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use emit::{Emitter, EmittedProperty, MethodEmitter, TypeEmitter};
pub use generate::{GenerateError, Generation, generate};
pub use model::TypeModel;
pub use plan::{
    Arg, ClientPlan, Invoked, MethodPlan, PlanEmitter, PlanMethodEmitter, PlanOp,
    PlanTypeEmitter, PropertySlot, ReturnShape,
};
pub use resolve::SerializationResolver;
pub use source::{SourceEmitter, SourceMethodEmitter, SourceTypeEmitter};
