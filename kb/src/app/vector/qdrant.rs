use std::collections::HashMap;
use std::sync::Arc;

use qdrant_client::qdrant::alias_operations::Action;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config;
use qdrant_client::qdrant::with_payload_selector::SelectorOptions;
use qdrant_client::qdrant::{
    AliasOperations, Condition, CountPoints, CreateAlias, CreateCollection, DeletePointsBuilder,
    Distance, Filter, GetCollectionInfoResponse, PointStruct, ScrollPointsBuilder, SearchParams,
    SearchPoints, UpdateCollectionAliasesRequest, UpsertPointsBuilder, Value as QdrantValue,
    VectorParams, VectorsConfig, WithPayloadSelector,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::core::model::collection::{CreateVectorCollection, VectorCollection};
use crate::core::vector::{VectorDb, VectorHit, VectorRecord, FILE_REGISTRY_ID_KEY};
use crate::error::{KbErr, KbError};
use crate::{err, map_err};

/// Payload key the chunk text is stored under; every other key in a
/// [VectorRecord]'s metadata map is stored as-is alongside it.
const TEXT_PROPERTY: &str = "text";

/// Alias for an arced Qdrant client, shared across services (§4.2).
pub type QdrantDb = Arc<Qdrant>;

pub fn init(url: &str) -> QdrantDb {
    info!("Connecting to qdrant at {url}");
    Arc::new(Qdrant::from_url(url).build().expect("error initialising qdrant"))
}

#[async_trait::async_trait]
impl VectorDb for Qdrant {
    fn id(&self) -> &'static str {
        "qdrant"
    }

    async fn list_vector_collections(&self) -> Result<Vec<VectorCollection>, KbError> {
        let names = map_err!(self.list_collections().await)
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect::<Vec<_>>();

        let mut collections = vec![];
        for name in names {
            let info = map_err!(self.collection_info(&name).await);
            if let Some(size) = collection_size(&info) {
                collections.push(VectorCollection::new(name, size));
            }
        }
        Ok(collections)
    }

    async fn create_vector_collection(&self, data: CreateVectorCollection<'_>) -> Result<(), KbError> {
        let config = VectorsConfig {
            config: Some(Config::Params(VectorParams {
                size: data.size as u64,
                distance: Distance::Cosine.into(),
                ..Default::default()
            })),
        };

        let result = map_err!(
            self.create_collection(CreateCollection {
                collection_name: data.name.to_string(),
                vectors_config: Some(config),
                ..Default::default()
            })
            .await
        );

        debug_assert!(result.result);

        Ok(())
    }

    async fn get_collection(&self, name: &str) -> Result<VectorCollection, KbError> {
        let info = map_err!(self.collection_info(name).await);
        let Some(size) = collection_size(&info) else {
            return err!(NotFound, "size information for vector collection '{}'", name);
        };
        Ok(VectorCollection::new(name.to_string(), size))
    }

    async fn delete_vector_collection(&self, name: &str) -> Result<(), KbError> {
        map_err!(self.delete_collection(name).await);
        Ok(())
    }

    /// Qdrant has no native rename. `CatalogService` keeps the underlying
    /// collection named by its immutable `vector_uuid` forever, so a
    /// catalog rename is implemented here as an alias: `old` stays the
    /// real collection name and `new` becomes an alias pointing at it.
    async fn rename_vector_collection(&self, old: &str, new: &str) -> Result<(), KbError> {
        let op = AliasOperations {
            action: Some(Action::CreateAlias(CreateAlias {
                collection_name: old.to_string(),
                alias_name: new.to_string(),
            })),
        };
        map_err!(
            self.update_collection_aliases(UpdateCollectionAliasesRequest {
                actions: vec![op],
                timeout: None,
            })
            .await
        );
        Ok(())
    }

    async fn create_default_collection(&self, data: CreateVectorCollection<'_>) {
        let name = data.name.to_string();
        match self.create_vector_collection(data).await {
            Ok(()) => {}
            Err(KbError {
                error: KbErr::Qdrant(QdrantError::ResponseError { status }),
                ..
            }) if matches!(status.code(), tonic::Code::AlreadyExists) => {
                debug!("default collection '{name}' already exists");
            }
            Err(e) => panic!("error creating default collection: {e}"),
        }
    }

    async fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        top_k: u32,
    ) -> Result<Vec<VectorHit>, KbError> {
        let search_points = SearchPoints {
            collection_name: collection.to_string(),
            vector,
            limit: top_k as u64,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(SelectorOptions::Enable(true)),
            }),
            params: Some(SearchParams::default()),
            ..Default::default()
        };

        let result = map_err!(self.search_points(search_points).await);

        Ok(result
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .and_then(|id| id.point_id_options)
                    .map(point_id_to_string)
                    .unwrap_or_default();
                let (text, metadata) = split_payload(point.payload);
                VectorHit {
                    id,
                    text,
                    metadata,
                    distance: 1.0 - point.score,
                }
            })
            .collect())
    }

    async fn add_batch(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), KbError> {
        debug!("Inserting {} vectors into {collection}", records.len());

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let payload = metadata_to_payload(&record.text, &record.metadata);
                PointStruct::new(record.id, record.vector, payload)
            })
            .collect();

        map_err!(
            self.upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
                .await
        );

        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<(), KbError> {
        let point_ids = ids.iter().cloned().map(Into::into).collect::<Vec<_>>();
        map_err!(
            self.delete_points(
                DeletePointsBuilder::new(collection)
                    .points(point_ids)
                    .wait(true),
            )
            .await
        );
        Ok(())
    }

    async fn delete_by_file(&self, collection: &str, file_registry_id: &str) -> Result<usize, KbError> {
        let count = self.count_by_file(collection, file_registry_id).await?;

        if count == 0 {
            return Ok(0);
        }

        map_err!(
            self.delete_points(
                DeletePointsBuilder::new(collection)
                    .points(Filter::must([Condition::matches(
                        FILE_REGISTRY_ID_KEY,
                        file_registry_id.to_string(),
                    )]))
                    .wait(true),
            )
            .await
        );

        Ok(count)
    }

    async fn count_by_file(&self, collection: &str, file_registry_id: &str) -> Result<usize, KbError> {
        let request = CountPoints {
            collection_name: collection.to_string(),
            filter: Some(Filter::must([Condition::matches(
                FILE_REGISTRY_ID_KEY,
                file_registry_id.to_string(),
            )])),
            exact: Some(true),
            ..Default::default()
        };
        let result = map_err!(self.count(request).await);
        Ok(result.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn list_by_file(&self, collection: &str, file_registry_id: &str) -> Result<Vec<VectorHit>, KbError> {
        let result = map_err!(
            self.scroll(
                ScrollPointsBuilder::new(collection)
                    .filter(Filter::must([Condition::matches(
                        FILE_REGISTRY_ID_KEY,
                        file_registry_id.to_string(),
                    )]))
                    .with_payload(true)
                    .with_vectors(false)
                    .limit(10_000),
            )
            .await
        );

        Ok(result
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .and_then(|id| id.point_id_options)
                    .map(point_id_to_string)
                    .unwrap_or_default();
                let (text, metadata) = split_payload(point.payload);
                VectorHit {
                    id,
                    text,
                    metadata,
                    distance: 0.0,
                }
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize, KbError> {
        let request = CountPoints {
            collection_name: collection.to_string(),
            exact: Some(true),
            ..Default::default()
        };
        let result = map_err!(self.count(request).await);
        Ok(result.result.map(|r| r.count as usize).unwrap_or(0))
    }
}

fn collection_size(info: &GetCollectionInfoResponse) -> Option<usize> {
    let config = info
        .result
        .as_ref()?
        .config
        .as_ref()?
        .params
        .as_ref()?
        .vectors_config
        .as_ref()?
        .config
        .as_ref()?;
    match config {
        Config::Params(VectorParams { size, .. }) => Some(*size as usize),
        Config::ParamsMap(pm) => {
            warn!("found unexpected params map: {pm:?}");
            None
        }
    }
}

fn metadata_to_payload(text: &str, metadata: &Map<String, Value>) -> Payload {
    let mut payload = Payload::new();
    payload.insert(TEXT_PROPERTY, text.to_string());
    for (key, value) in metadata {
        match value {
            Value::String(s) => payload.insert(key.clone(), s.clone()),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    payload.insert(key.clone(), i);
                } else if let Some(f) = n.as_f64() {
                    payload.insert(key.clone(), f);
                }
            }
            Value::Bool(b) => payload.insert(key.clone(), *b),
            Value::Null => {}
            other => payload.insert(key.clone(), other.to_string()),
        }
    }
    payload
}

fn split_payload(payload: HashMap<String, QdrantValue>) -> (String, Map<String, Value>) {
    let mut metadata = Map::new();
    let mut text = String::new();

    for (key, value) in payload {
        let json = qdrant_value_to_json(value);
        if key == TEXT_PROPERTY {
            text = json.as_str().unwrap_or_default().to_string();
            continue;
        }
        metadata.insert(key, json);
    }

    (text, metadata)
}

fn qdrant_value_to_json(value: QdrantValue) -> Value {
    match value.kind {
        Some(Kind::NullValue(_)) | None => Value::Null,
        Some(Kind::DoubleValue(d)) => serde_json::json!(d),
        Some(Kind::IntegerValue(i)) => serde_json::json!(i),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::StructValue(_)) | Some(Kind::ListValue(_)) => Value::Null,
    }
}

fn point_id_to_string(id: PointIdOptions) -> String {
    match id {
        PointIdOptions::Num(n) => n.to_string(),
        PointIdOptions::Uuid(s) => s,
    }
}
