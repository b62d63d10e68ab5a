/// Router Module Index
///
/// Routes are grouped by the authorization they require. Authentication is not
/// enforced by a layer: every handler in `authenticated` extracts `AuthUser`,
/// which rejects before the handler body runs.

/// Routes accessible to any client.
pub mod public;

/// Routes whose handlers require a bearer token naming an existing user.
pub mod authenticated;

/// Routes mounted only in `Env::Test`.
pub mod testing;
