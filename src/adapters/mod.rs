//! External system integrations for ExFig.
//!
//! - [`remote`] - The remote design API: request capability and the
//!   rate-limited, retrying client every worker shares
//!
//! The engine never talks HTTP itself. A transport implements
//! [`remote::RemoteClient`] and is wrapped in a [`remote::RateLimitedClient`]
//! by the batch coordinator.

pub mod remote;
