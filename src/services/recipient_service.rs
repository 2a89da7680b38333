//! services/recipient_service.rs
//! Separa los destinatarios de una notificación en principal + lote CC.

/// Destinatarios de un dispatch: el primero es el principal, el resto va en CC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientGroups {
    pub primary: String,
    pub cc: Vec<String>,
}

impl RecipientGroups {
    pub fn has_cc(&self) -> bool {
        !self.cc.is_empty()
    }
}

/// Recorta espacios y descarta entradas vacías, conservando el orden.
/// Devuelve `None` solo si no queda ninguna dirección; quien llama valida eso antes.
pub fn split_recipients<I, S>(addresses: I) -> Option<RecipientGroups>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned = addresses
        .into_iter()
        .map(|a| a.as_ref().trim().to_string())
        .filter(|a| !a.is_empty());

    let primary = cleaned.next()?;
    Some(RecipientGroups {
        primary,
        cc: cleaned.collect(),
    })
}
