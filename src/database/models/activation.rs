use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::validation::{check_amount, clean, is_all_digits, is_valid_email, parse_timestamp, ValidationError};

/// Accepted activation types, lowercase
pub const TIPOS: [&str; 3] = ["básico", "premium", "empresarial"];

/// A recorded field visit
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activation {
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub lugar_activacion: String,
    pub fecha: DateTime<Utc>,
    pub se_descargo_app: bool,
    pub registro: bool,
    pub cash_in: Decimal,
    pub cash_out: Decimal,
    pub p2p: bool,
    pub qr_fisico: bool,
    pub respaldo: bool,
    pub hubo_error: bool,
    pub tipo: String,
    pub nombre: String,
    pub apellido: String,
    pub cedula_identidad: String,
    pub telefono: String,
    pub correo: Option<String>,
    /// URLs of uploaded photos, stored as a JSON array
    pub fotos: Json<Vec<String>>,
    pub tipo_error: Option<String>,
    pub clasificacion_comercio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for POST /activaciones
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivationInput {
    pub lugar_activacion: Option<String>,
    pub fecha: Option<String>,
    pub se_descargo_app: Option<bool>,
    pub registro: Option<bool>,
    pub cash_in: Option<Decimal>,
    pub cash_out: Option<Decimal>,
    pub p2p: Option<bool>,
    pub qr_fisico: Option<bool>,
    pub respaldo: Option<bool>,
    pub hubo_error: Option<bool>,
    pub tipo: Option<String>,
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub cedula_identidad: Option<String>,
    pub telefono: Option<String>,
    pub correo: Option<String>,
    pub fotos: Option<Vec<String>>,
    pub tipo_error: Option<String>,
    pub clasificacion_comercio: Option<String>,
}

/// Validated activation, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivation {
    pub usuario_id: Uuid,
    pub lugar_activacion: String,
    pub fecha: DateTime<Utc>,
    pub se_descargo_app: bool,
    pub registro: bool,
    pub cash_in: Decimal,
    pub cash_out: Decimal,
    pub p2p: bool,
    pub qr_fisico: bool,
    pub respaldo: bool,
    pub hubo_error: bool,
    pub tipo: String,
    pub nombre: String,
    pub apellido: String,
    pub cedula_identidad: String,
    pub telefono: String,
    pub correo: Option<String>,
    pub fotos: Vec<String>,
    pub tipo_error: Option<String>,
    pub clasificacion_comercio: Option<String>,
}

impl ActivationInput {
    /// Validate and stamp the record with the authenticated account
    pub fn validate(self, usuario_id: Uuid) -> Result<NewActivation, ValidationError> {
        let lugar_activacion = clean(self.lugar_activacion);
        let fecha = clean(self.fecha);
        let tipo = clean(self.tipo);
        let nombre = clean(self.nombre);
        let apellido = clean(self.apellido);
        let cedula_identidad = clean(self.cedula_identidad);
        let telefono = clean(self.telefono);

        let (
            Some(lugar_activacion),
            Some(fecha),
            Some(tipo),
            Some(nombre),
            Some(apellido),
            Some(cedula_identidad),
            Some(telefono),
        ) = (
            lugar_activacion.clone(),
            fecha.clone(),
            tipo.clone(),
            nombre.clone(),
            apellido.clone(),
            cedula_identidad.clone(),
            telefono.clone(),
        )
        else {
            let missing: Vec<&str> = [
                ("lugar_activacion", lugar_activacion.is_none()),
                ("fecha", fecha.is_none()),
                ("tipo", tipo.is_none()),
                ("nombre", nombre.is_none()),
                ("apellido", apellido.is_none()),
                ("cedula_identidad", cedula_identidad.is_none()),
                ("telefono", telefono.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, absent)| absent.then_some(field))
            .collect();
            return Err(ValidationError::missing(&missing));
        };

        if !is_all_digits(&cedula_identidad) {
            return Err(ValidationError::field(
                "cedula_identidad",
                "National ID must contain only digits",
            ));
        }

        let correo = clean(self.correo);
        if let Some(correo) = &correo {
            if !is_valid_email(correo) {
                return Err(ValidationError::field("correo", "Invalid email address"));
            }
        }

        let tipo = tipo.to_lowercase();
        if !TIPOS.contains(&tipo.as_str()) {
            return Err(ValidationError::field(
                "tipo",
                format!("Activation type must be one of: {}", TIPOS.join(", ")),
            ));
        }

        let fecha = parse_timestamp(&fecha)
            .ok_or_else(|| ValidationError::field("fecha", "Invalid date"))?;

        let cash_in = self.cash_in.unwrap_or_default();
        let cash_out = self.cash_out.unwrap_or_default();
        check_amount("cash_in", cash_in)?;
        check_amount("cash_out", cash_out)?;

        let fotos = self
            .fotos
            .unwrap_or_default()
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        Ok(NewActivation {
            usuario_id,
            lugar_activacion,
            fecha,
            se_descargo_app: self.se_descargo_app.unwrap_or(false),
            registro: self.registro.unwrap_or(false),
            cash_in,
            cash_out,
            p2p: self.p2p.unwrap_or(false),
            qr_fisico: self.qr_fisico.unwrap_or(false),
            respaldo: self.respaldo.unwrap_or(false),
            hubo_error: self.hubo_error.unwrap_or(false),
            tipo,
            nombre,
            apellido,
            cedula_identidad,
            telefono,
            correo,
            fotos,
            tipo_error: clean(self.tipo_error),
            clasificacion_comercio: clean(self.clasificacion_comercio),
        })
    }
}
