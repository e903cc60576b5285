//! The two-operation surface shared by local and remote callers.

use crate::models::{SaveRequest, SaveResponse};
use crate::Result;

/// Save and read operations, served in-process or over JSON-RPC.
///
/// [`SymbolService`](super::SymbolService) implements this directly;
/// [`RpcClient`](crate::mcp::RpcClient) implements it over a transport.
/// The apply workflow and the tool bridge only depend on this trait.
pub trait SymbolGateway {
    /// Saves an entry and returns the store outcome plus any suggestions.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for bad arguments, or a
    /// transport/storage error.
    fn save(&self, request: &SaveRequest) -> Result<SaveResponse>;

    /// Returns the body stored under a symbol or alias.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the name does not resolve.
    fn read(&self, symbol_or_alias: &str) -> Result<String>;
}

impl<G: SymbolGateway + ?Sized> SymbolGateway for &G {
    fn save(&self, request: &SaveRequest) -> Result<SaveResponse> {
        (**self).save(request)
    }

    fn read(&self, symbol_or_alias: &str) -> Result<String> {
        (**self).read(symbol_or_alias)
    }
}
