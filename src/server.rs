use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::connection::{Connection, ConnectionError};
use crate::protocol::Command;
use crate::store::TupleStore;

/// TCP server in front of one shared tuple store
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    store: Arc<TupleStore>,
}

impl Server {
    /// Bind to `addr` with a fresh store
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        Self::bind_with_store(addr, Arc::new(TupleStore::new())).await
    }

    /// Bind to `addr` serving an existing store
    pub async fn bind_with_store(addr: &str, store: Arc<TupleStore>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("TCP server bound to {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            store,
        })
    }

    /// Get local listening address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn store(&self) -> Arc<TupleStore> {
        Arc::clone(&self.store)
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Each connection gets its own task. Handlers already running are left
    /// to finish on their own; the listening socket is closed on return.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Server {
            listener,
            local_addr,
            store,
        } = self;
        info!("Server started, listening on {}", local_addr);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        info!("New connection accepted from {}", peer_addr);
                        store.register_client();
                        spawn_handler(stream, peer_addr, Arc::clone(&store));
                    }
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                    }
                },
            }
        }
    }

    pub async fn run_until_ctrl_c(self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to install ctrl-c handler: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

fn spawn_handler(stream: TcpStream, peer_addr: SocketAddr, store: Arc<TupleStore>) {
    tokio::spawn(async move {
        if let Err(e) = handle_connection(stream, peer_addr, &store).await {
            warn!("Closing connection from {}: {}", peer_addr, e);
        }
        info!("Connection handler ended for {}", peer_addr);
    });
}

/// Serve one client until it disconnects or sends a malformed frame
async fn handle_connection<S>(
    stream: S,
    peer_addr: SocketAddr,
    store: &TupleStore,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut connection = Connection::new(stream);

    while let Some(frame) = connection.read_frame().await? {
        let command = Command::from_frame(&frame)?;
        debug!(
            peer = %peer_addr,
            op = %command.op(),
            key = command.key(),
            "Received request"
        );

        let response = command.execute(store);
        if response.is_error() {
            debug!(peer = %peer_addr, "{}", response.body());
        }
        connection.write_frame(&response.encode()?).await?;
    }

    info!("Connection closed by client: {}", peer_addr);
    Ok(())
}
