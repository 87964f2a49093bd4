use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::sync::Arc;
use tracing::info;

use super::migrator::{SchemaMigrator, SchemaReport};
use super::store::Store;
use crate::error::VirtcolError;
use crate::model::{ModelType, Record};

#[derive(Debug)]
pub enum StoreMessage {
    /// Create the table and any missing columns for a finalized model.
    ApplySchema(Arc<ModelType>, RpcReplyPort<Result<SchemaReport, VirtcolError>>),

    /// Bulk-create a record from an untrusted JSON object and return it with its id.
    Create(
        Arc<ModelType>,
        serde_json::Value,
        RpcReplyPort<Result<Record, VirtcolError>>,
    ),

    /// Insert or update a record and return it as persisted.
    Save(Record, RpcReplyPort<Result<Record, VirtcolError>>),

    /// Load one record by id.
    Find(Arc<ModelType>, i64, RpcReplyPort<Result<Option<Record>, VirtcolError>>),

    /// Load every record of a model, ordered by id.
    All(Arc<ModelType>, RpcReplyPort<Result<Vec<Record>, VirtcolError>>),
}

/// Cloneable handle to the store actor. All store access through it is serialized.
#[derive(Clone)]
pub struct StoreHandle {
    actor: ActorRef<StoreMessage>,
}

impl StoreHandle {
    pub async fn migrate(&self, model: Arc<ModelType>) -> Result<SchemaReport, VirtcolError> {
        ractor::call!(self.actor, StoreMessage::ApplySchema, model)
            .map_err(|e| VirtcolError::Actor(format!("StoreActor ApplySchema RPC failed: {e}")))?
    }

    pub async fn create(
        &self,
        model: &Arc<ModelType>,
        attrs: serde_json::Value,
    ) -> Result<Record, VirtcolError> {
        ractor::call!(self.actor, StoreMessage::Create, Arc::clone(model), attrs)
            .map_err(|e| VirtcolError::Actor(format!("StoreActor Create RPC failed: {e}")))?
    }

    pub async fn save(&self, record: Record) -> Result<Record, VirtcolError> {
        ractor::call!(self.actor, StoreMessage::Save, record)
            .map_err(|e| VirtcolError::Actor(format!("StoreActor Save RPC failed: {e}")))?
    }

    pub async fn find(
        &self,
        model: &Arc<ModelType>,
        id: i64,
    ) -> Result<Option<Record>, VirtcolError> {
        ractor::call!(self.actor, StoreMessage::Find, Arc::clone(model), id)
            .map_err(|e| VirtcolError::Actor(format!("StoreActor Find RPC failed: {e}")))?
    }

    pub async fn all(&self, model: &Arc<ModelType>) -> Result<Vec<Record>, VirtcolError> {
        ractor::call!(self.actor, StoreMessage::All, Arc::clone(model))
            .map_err(|e| VirtcolError::Actor(format!("StoreActor All RPC failed: {e}")))?
    }

    /// Stops the actor; pending calls fail with an actor error.
    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

#[async_trait]
impl SchemaMigrator for StoreHandle {
    async fn apply_schema(&self, model: &ModelType) -> Result<SchemaReport, VirtcolError> {
        self.migrate(Arc::new(model.clone())).await
    }
}

struct StoreActorState {
    store: Store,
}

struct StoreActor;

#[ractor::async_trait]
impl Actor for StoreActor {
    type Msg = StoreMessage;
    type State = StoreActorState;
    type Arguments = Store;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        store: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!("StoreActor initialized");
        Ok(StoreActorState { store })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.store.close().await;
        info!("StoreActor stopped");
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            StoreMessage::ApplySchema(model, reply) => {
                let res = state.store.apply_schema(&model).await;
                let _ = reply.send(res);
            }
            StoreMessage::Create(model, attrs, reply) => {
                let res = state.store.create(&model, &attrs).await;
                let _ = reply.send(res);
            }
            StoreMessage::Save(mut record, reply) => {
                let res = state.store.save(&mut record).await.map(|()| record);
                let _ = reply.send(res);
            }
            StoreMessage::Find(model, id, reply) => {
                let res = state.store.find(&model, id).await;
                let _ = reply.send(res);
            }
            StoreMessage::All(model, reply) => {
                let res = state.store.all(&model).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

/// Spawn the store actor around an already connected store and return a cloneable handle.
pub async fn spawn(store: Store) -> Result<StoreHandle, VirtcolError> {
    // Unnamed so several stores can live in one process.
    let (actor, _jh) = Actor::spawn(None, StoreActor, store)
        .await
        .map_err(|e| VirtcolError::Actor(format!("failed to spawn StoreActor: {e}")))?;

    Ok(StoreHandle { actor })
}
