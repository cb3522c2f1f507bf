//! CrudService: generic CRUD using the safe SQL builder and registry-driven validation.

mod crud;
mod validation;
pub use crud::{CrudService, Page, DEFAULT_PAGE_SIZE};
pub use validation::RecordValidator;
