//! PostgreSQL `COPY ... FROM STDIN` backend for the loader.

use super::{load, BulkSession, LoadOptions, LoadStats};
use crate::encoder::{EncodedStreams, RowStream};
use crate::error::SeedError;
use crate::schema::CopyTarget;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio_postgres::{Client, Config, NoTls, Transaction};

#[async_trait]
impl<'a> BulkSession for Transaction<'a> {
    async fn copy_rows(&mut self, target: &CopyTarget, mut rows: RowStream) -> Result<u64, SeedError> {
        let sink = self
            .copy_in::<str, Bytes>(target.statement.as_str())
            .await
            .map_err(|e| SeedError::from_postgres(&target.table, e))?;
        futures::pin_mut!(sink);

        while let Some(chunk) = rows.next().await {
            // Returning early drops the sink unfinished, which aborts the COPY.
            let chunk = chunk?;
            sink.send(chunk)
                .await
                .map_err(|e| SeedError::from_postgres(&target.table, e))?;
        }

        sink.as_mut()
            .finish()
            .await
            .map_err(|e| SeedError::from_postgres(&target.table, e))
    }

    async fn commit(self) -> Result<(), SeedError> {
        Transaction::commit(self)
            .await
            .map_err(|e| SeedError::from_postgres("transaction commit", e))
    }

    async fn rollback(self) -> Result<(), SeedError> {
        Transaction::rollback(self)
            .await
            .map_err(|e| SeedError::from_postgres("transaction rollback", e))
    }
}

/// Connect without TLS and drive the connection on a background task
pub async fn connect(config: &Config) -> Result<Client, SeedError> {
    let (client, connection) = config
        .connect(NoTls)
        .await
        .map_err(|e| SeedError::Connection(Box::new(e)))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("Warning: database connection closed with error: {}", e);
        }
    });

    Ok(client)
}

/// Open a transaction on `client` and load both streams through it
pub async fn load_postgres(
    client: &mut Client,
    streams: EncodedStreams,
    options: &LoadOptions,
) -> Result<LoadStats, SeedError> {
    let transaction = client
        .transaction()
        .await
        .map_err(|e| SeedError::from_postgres("transaction begin", e))?;
    load(transaction, streams, options).await
}
