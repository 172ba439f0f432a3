//! Physical execution (component 4.G): [`operators`] walks a logical plan
//! into row batches; [`statement`] is the thin dispatcher above it that
//! routes a parsed [`crate::ast::Statement`] to either the query path or one
//! of the DDL/copy paths and shapes the result the way [`crate::Connection`]
//! hands back to callers.

pub mod operators;
pub mod statement;
