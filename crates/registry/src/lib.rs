//! Per-agent capability registry: the whitelist of host functions, classes,
//! modules, and instances exposed to the sandbox interpreter.
//!
//! [`Registry`] holds four independent tables (functions, classes, modules,
//! instances). Pattern-based include/exclude rules gate which members of a
//! class/module/instance are available, and `per_member_overrides` let a
//! later, more specific registration refine a broader one without
//! re-declaring it.

pub mod class;
pub mod error;
pub mod function;
pub mod instance;
pub mod module;
pub mod overrides;
pub mod pattern;
pub mod registry;
pub mod visibility;

pub use class::ClassEntry;
pub use error::RegistryError;
pub use function::{FunctionEntry, HostFn};
pub use instance::InstanceEntry;
pub use module::ModuleEntry;
pub use overrides::{MemberOverride, ResolvedMember};
pub use pattern::Pattern;
pub use registry::{Capability, CapabilityDescription, Registry};
pub use visibility::Visibility;
