use thiserror::Error;

/// Tipo de error legible por máquina. El adaptador HTTP es el único lugar
/// donde esto se traduce a un código de estado — el dominio y los casos de
/// uso sólo producen `TransferError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    InvalidAmount,
    AmountTooSmall,
    InvalidWalletId,
    SameWalletTransfer,
    InsufficientBalance,
    WalletNotFound,
    DuplicateRequest,
    ConcurrentProcessing,
    ValidationError,
    TransferFailed,
    InternalError,
}

impl ErrorKind {
    /// La cadena estable expuesta en los cuerpos de error de la API (p. ej. `"INSUFFICIENT_BALANCE"`).
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::InvalidAmount => "INVALID_AMOUNT",
            ErrorKind::AmountTooSmall => "AMOUNT_TOO_SMALL",
            ErrorKind::InvalidWalletId => "INVALID_WALLET_ID",
            ErrorKind::SameWalletTransfer => "SAME_WALLET_TRANSFER",
            ErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorKind::WalletNotFound => "WALLET_NOT_FOUND",
            ErrorKind::DuplicateRequest => "DUPLICATE_REQUEST",
            ErrorKind::ConcurrentProcessing => "CONCURRENT_PROCESSING",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::TransferFailed => "TRANSFER_FAILED",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Error categorizado de resultado-etiquetado compartido por el dominio, los
/// casos de uso y la infraestructura. Deliberadamente no es una excepción:
/// toda operación falible en este workspace retorna `Result<_, TransferError>`.
#[derive(Error, Debug)]
#[error("{kind:?}: {message}")]
pub struct TransferError {
    pub kind: ErrorKind,
    pub message: String,
}

impl TransferError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidAmount, message)
    }

    pub fn amount_too_small(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AmountTooSmall, message)
    }

    pub fn invalid_wallet_id(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidWalletId, message)
    }

    pub fn same_wallet_transfer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SameWalletTransfer, message)
    }

    pub fn insufficient_balance(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientBalance, message)
    }

    pub fn wallet_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::WalletNotFound, message)
    }

    pub fn duplicate_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateRequest, message)
    }

    pub fn concurrent_processing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConcurrentProcessing, message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn transfer_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransferFailed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }
}
