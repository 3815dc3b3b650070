use std::{future::Future, net::SocketAddr};

use anyhow::Context;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    task::JoinSet,
};
use tracing::{error, info, warn};

use crate::{
    config::{ReplicaOf, ServerConfig},
    connection::{handle_client_connection, handle_master_connection},
    rdb::load_rdb_file,
    state::State,
};

/// A bound server: the listener plus the state every connection shares.
#[derive(Debug)]
pub struct RedisServer {
    listener: TcpListener,
    state: State,
}

impl RedisServer {
    /// Loads the snapshot named by `config`, if any, and binds the listener.
    /// A snapshot that cannot be read is logged and the server starts empty.
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        let address = format!("0.0.0.0:{}", config.port);
        let state = State::new(config);

        match load_rdb_file(&state.config.dir, &state.config.dbfilename).await {
            Ok(Some(snapshot)) => {
                let loaded = state.store.load(snapshot.entries).await;
                info!(keys = loaded, "snapshot loaded");
            }
            Ok(None) => (),
            Err(e) => warn!(error = %e, "snapshot could not be loaded, starting empty"),
        }

        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {}", address))?;

        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Serves until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
    }

    /// Accepts connections until `shutdown` resolves, then stops the broker
    /// and the keyspace and waits for the connection tasks to end.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let address = self.local_addr()?;

        info!(
            address = %address,
            role = self.state.replication.role().as_str(),
            "server listening"
        );

        let mut connections = JoinSet::new();

        if let Some(master) = self.state.config.replicaof.clone() {
            connections.spawn(follow_master(master, self.state.clone()));
        }

        tokio::pin!(shutdown);

        loop {
            select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, address)) => {
                        connections.spawn(handle_client_connection(
                            stream,
                            address.to_string(),
                            self.state.clone(),
                        ));
                    }
                    Err(e) => warn!(error = %e, "failed to accept connection"),
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => (),
                _ = &mut shutdown => break,
            }
        }

        info!("shutting down");
        self.state.shutdown().await;
        connections.shutdown().await;

        Ok(())
    }
}

async fn follow_master(master: ReplicaOf, state: State) {
    let address = format!("{}:{}", master.host, master.port);

    let stream = match TcpStream::connect(&address).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(master = %address, error = %e, "failed to connect to master");
            return;
        }
    };

    info!(master = %address, "connected to master");

    if let Err(e) = handle_master_connection(stream, state).await {
        error!(master = %address, error = ?e, "replication link failed");
    }
}
