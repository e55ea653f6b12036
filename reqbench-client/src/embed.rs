//! Surface for embedding the client in a host runtime.
//!
//! A host that holds a global lock (an interpreter lock, a cooperative
//! scheduler slot) supplies a [`BlockingHook`] that releases it around each
//! blocking call and reacquires it afterwards. The client itself knows
//! nothing about the host.

use crate::transport::{Connector, TcpConnector};
use crate::Client;

/// Wraps every blocking network call made through this module.
pub trait BlockingHook {
    fn run_blocking<R>(&self, f: impl FnOnce() -> R) -> R;
}

/// Runs the call inline; for hosts with nothing to release.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHook;

impl BlockingHook for NoHook {
    fn run_blocking<R>(&self, f: impl FnOnce() -> R) -> R {
        f()
    }
}

impl<H: BlockingHook> BlockingHook for &H {
    fn run_blocking<R>(&self, f: impl FnOnce() -> R) -> R {
        (**self).run_blocking(f)
    }
}

/// A [`Client`] whose `get` and `close` run inside the host's hook.
pub struct EmbeddedClient<H: BlockingHook, C: Connector = TcpConnector> {
    hook: H,
    client: Client<C>,
}

impl<H: BlockingHook> EmbeddedClient<H> {
    pub fn new(hook: H) -> Self {
        Self::with_client(hook, Client::new())
    }
}

impl<H: BlockingHook, C: Connector> EmbeddedClient<H, C> {
    pub fn with_client(hook: H, client: Client<C>) -> Self {
        Self { hook, client }
    }

    pub fn client(&self) -> &Client<C> {
        &self.client
    }

    pub fn get(&mut self, url: &str) -> u16 {
        let client = &mut self.client;
        self.hook.run_blocking(|| client.get(url))
    }

    pub fn close(&mut self) {
        let client = &mut self.client;
        self.hook.run_blocking(|| client.close())
    }
}

/// One-shot GET on a fresh connection that is closed before returning.
pub fn send_req(url: &str) -> u16 {
    send_req_with(&NoHook, url)
}

/// [`send_req`] with the blocking part run inside `hook`.
pub fn send_req_with<H: BlockingHook>(hook: &H, url: &str) -> u16 {
    hook.run_blocking(|| {
        let mut client = Client::new();
        let status = client.get(url);
        client.close();
        status
    })
}
