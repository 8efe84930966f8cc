use serde::{Deserialize, Serialize};

/// Predefined biographies a user can pick from.
pub const BIOGRAFIAS_DISPONIBLES: [&str; 4] = [
    "Casual, me gustan los ponis",
    "Amante de la naturaleza y los viajes",
    "Me gusta la informática, por algo me dedico a este mundillo",
    "Deportista me gusta más que solo el futbol...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Masculino,
    Femenino,
    Otro,
    PrefieroNoDecir,
}

impl Sex {
    pub const ALL: [Sex; 4] = [
        Sex::Masculino,
        Sex::Femenino,
        Sex::Otro,
        Sex::PrefieroNoDecir,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Masculino => "masculino",
            Sex::Femenino => "femenino",
            Sex::Otro => "otro",
            Sex::PrefieroNoDecir => "prefiero_no_decir",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

/// Request body for registration. Every field is required; presence is
/// checked by hand so the error message matches the API contract.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub nombre: Option<String>,
    pub apellidos: Option<String>,
    pub sexo: Option<String>,
    pub biografia: Option<String>,
    pub gusto_principal1: Option<String>,
    pub gusto_principal2: Option<String>,
    pub gusto_principal3: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Partial profile update. Unknown fields (password, email, id) are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub nombre: Option<String>,
    pub apellidos: Option<String>,
    pub sexo: Option<String>,
    pub biografia: Option<String>,
    pub gusto_principal1: Option<String>,
    pub gusto_principal2: Option<String>,
    pub gusto_principal3: Option<String>,
}

/// `{"mensaje": "..."}` confirmation body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub mensaje: &'static str,
}
