use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use super::{
    dto::{LoginRequest, RegisterRequest, Sex, UpdateUserRequest, BIOGRAFIAS_DISPONIBLES},
    password,
};
use crate::{
    error::ApiError,
    graph::{normalize_tag, Graph, NewUser, UserChanges, UserNode},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Ids come straight from the URL; anything that is not a UUID matches no node.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

fn check_sex(raw: &str) -> Result<String, ApiError> {
    Sex::parse(raw.trim())
        .map(|s| s.as_str().to_string())
        .ok_or(ApiError::InvalidSex)
}

fn check_biography(raw: &str) -> Result<String, ApiError> {
    BIOGRAFIAS_DISPONIBLES
        .iter()
        .find(|b| **b == raw)
        .map(|b| b.to_string())
        .ok_or(ApiError::InvalidBiography)
}

fn check_taste(raw: String) -> Result<String, ApiError> {
    let tag = normalize_tag(&raw);
    if tag.is_empty() {
        return Err(ApiError::bad_request("Los gustos no pueden estar vacios"));
    }
    Ok(tag)
}

/// Validates and normalizes a registration body into a storable user.
pub(crate) fn validate_registration(req: RegisterRequest) -> Result<(NewUser, String), ApiError> {
    let missing = || ApiError::bad_request("Todos los campos son obligatorios");
    let nombre = required(req.nombre).ok_or_else(missing)?;
    let apellidos = required(req.apellidos).ok_or_else(missing)?;
    let sexo = required(req.sexo).ok_or_else(missing)?;
    let biografia = required(req.biografia).ok_or_else(missing)?;
    let g1 = required(req.gusto_principal1).ok_or_else(missing)?;
    let g2 = required(req.gusto_principal2).ok_or_else(missing)?;
    let g3 = required(req.gusto_principal3).ok_or_else(missing)?;
    let email = required(req.email).ok_or_else(missing)?;
    let password = required(req.password).ok_or_else(missing)?;

    let sexo = check_sex(&sexo)?;
    let biografia = check_biography(&biografia)?;

    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Email no valido"));
    }

    let user = NewUser {
        nombre: nombre.trim().to_string(),
        apellidos: apellidos.trim().to_string(),
        sexo,
        biografia,
        gustos: [check_taste(g1)?, check_taste(g2)?, check_taste(g3)?],
        email,
        // filled in by `register` once the body is known to be valid
        password_hash: String::new(),
    };
    Ok((user, password))
}

/// Validates a partial update. Only profile fields are carried over.
pub(crate) fn validate_update(req: UpdateUserRequest) -> Result<UserChanges, ApiError> {
    Ok(UserChanges {
        nombre: req.nombre.map(|v| v.trim().to_string()),
        apellidos: req.apellidos.map(|v| v.trim().to_string()),
        sexo: req.sexo.as_deref().map(check_sex).transpose()?,
        biografia: req.biografia.as_deref().map(check_biography).transpose()?,
        gusto_principal1: req.gusto_principal1.map(check_taste).transpose()?,
        gusto_principal2: req.gusto_principal2.map(check_taste).transpose()?,
        gusto_principal3: req.gusto_principal3.map(check_taste).transpose()?,
    })
}

pub async fn register(graph: &dyn Graph, req: RegisterRequest) -> Result<UserNode, ApiError> {
    let (mut user, plain) = validate_registration(req)?;

    if graph.find_user_by_email(&user.email).await?.is_some() {
        return Err(ApiError::EmailTaken);
    }

    user.password_hash = password::hash(plain).await?;
    graph.create_user(user).await?.ok_or(ApiError::EmailTaken)
}

pub async fn login(graph: &dyn Graph, req: LoginRequest) -> Result<UserNode, ApiError> {
    let (Some(email), Some(plain)) = (required(req.email), required(req.password)) else {
        return Err(ApiError::bad_request("Email y password son obligatorios"));
    };

    let email = email.trim().to_lowercase();
    let user = graph
        .find_user_by_email(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !password::verify(plain, user.password_hash.clone()).await? {
        return Err(ApiError::InvalidCredentials);
    }
    Ok(user)
}

pub async fn get(graph: &dyn Graph, raw_id: &str) -> Result<UserNode, ApiError> {
    let id = parse_id(raw_id).ok_or(ApiError::UserNotFound)?;
    graph.find_user(id).await?.ok_or(ApiError::UserNotFound)
}

pub async fn update(
    graph: &dyn Graph,
    raw_id: &str,
    req: UpdateUserRequest,
) -> Result<UserNode, ApiError> {
    let id = parse_id(raw_id).ok_or(ApiError::UserNotFound)?;
    let changes = validate_update(req)?;
    if changes.is_empty() {
        return get(graph, raw_id).await;
    }
    graph
        .update_user(id, changes)
        .await?
        .ok_or(ApiError::UserNotFound)
}

pub async fn delete(graph: &dyn Graph, raw_id: &str) -> Result<(), ApiError> {
    let id = parse_id(raw_id).ok_or(ApiError::UserNotFound)?;
    if graph.delete_user(id).await? {
        Ok(())
    } else {
        Err(ApiError::UserNotFound)
    }
}
