use common::{Money, TransferError, WalletId};

/// Una solicitud de transferencia cuya forma ya fue probada válida: ids de
/// billetera parseados, un monto `Money` por encima del piso, una llave de
/// idempotencia acotada. El código aguas abajo (el Idempotency Coordinator,
/// el Transfer Executor) nunca vuelve a validar esto — el tipo mismo es la prueba.
#[derive(Debug, Clone)]
pub struct ValidatedTransferRequest {
    pub from_wallet_id: WalletId,
    pub to_wallet_id: WalletId,
    pub amount: Money,
    pub idempotency_key: String,
}

const MAX_IDEMPOTENCY_KEY_OCTETS: usize = 255;

/// Función pura sobre los campos crudos de la solicitud. Falla rápido, antes
/// de cualquier I/O, con errores categorizados. No se redondea `amount`; se
/// parsea y normaliza a 4 dígitos fraccionarios para almacenamiento, nunca
/// se re-escala para "corregir" la entrada del llamador.
pub fn validate_transfer_request(
    from_wallet_id: &str,
    to_wallet_id: &str,
    amount: &str,
    idempotency_key: &str,
) -> Result<ValidatedTransferRequest, TransferError> {
    if from_wallet_id.trim().is_empty()
        || to_wallet_id.trim().is_empty()
        || amount.trim().is_empty()
        || idempotency_key.is_empty()
    {
        return Err(TransferError::invalid_request(
            "fromWalletId, toWalletId, amount and idempotencyKey are all required",
        ));
    }

    if idempotency_key.as_bytes().len() > MAX_IDEMPOTENCY_KEY_OCTETS {
        return Err(TransferError::invalid_request(format!(
            "idempotencyKey must not exceed {MAX_IDEMPOTENCY_KEY_OCTETS} octets"
        )));
    }

    let from = WalletId::parse_canonical(from_wallet_id).ok_or_else(|| {
        TransferError::invalid_wallet_id(format!(
            "fromWalletId '{from_wallet_id}' is not a canonical 8-4-4-4-12 wallet id"
        ))
    })?;
    let to = WalletId::parse_canonical(to_wallet_id).ok_or_else(|| {
        TransferError::invalid_wallet_id(format!(
            "toWalletId '{to_wallet_id}' is not a canonical 8-4-4-4-12 wallet id"
        ))
    })?;

    if from == to {
        return Err(TransferError::same_wallet_transfer(
            "fromWalletId and toWalletId must differ",
        ));
    }

    let parsed_amount = Money::parse(amount)
        .ok_or_else(|| TransferError::invalid_amount(format!("'{amount}' is not a valid decimal amount")))?;

    if !parsed_amount.is_positive() {
        return Err(TransferError::invalid_amount(
            "amount must be strictly positive",
        ));
    }

    if !parsed_amount.meets_minimum_transfer() {
        return Err(TransferError::amount_too_small(
            "amount must be at least 0.0001",
        ));
    }

    Ok(ValidatedTransferRequest {
        from_wallet_id: from,
        to_wallet_id: to,
        amount: parsed_amount,
        idempotency_key: idempotency_key.to_string(),
    })
}
