use serde::Serialize;
use uuid::Uuid;

/// One row of the combined affinity ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffinityRecord {
    pub id: Uuid,
    pub nombre: String,
    pub apellidos: String,
    pub gustos_comunes: Vec<String>,
    pub hashtags_comunes: Vec<String>,
    pub num_gustos: usize,
    pub num_hashtags: usize,
    pub puntuacion_afinidad: usize,
}

/// One row of the hashtag-only similarity ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityRecord {
    pub id: Uuid,
    pub nombre: String,
    pub apellidos: String,
    pub hashtags_comunes: Vec<String>,
    pub cantidad: usize,
}
