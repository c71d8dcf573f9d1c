use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClientRequest {
    /// Ignored for CLIENTE callers, whose record is always linked to themselves.
    pub user_id: Option<i64>,
    pub name: String,
    pub cpf: String,
    pub email: Option<String>,
    pub phone: String,
    pub cep: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cep: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientSearchQuery {
    /// Matches the name (case-insensitive) or the CPF digits.
    pub search: Option<String>,
}
