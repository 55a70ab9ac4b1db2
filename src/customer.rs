//! Customer contact details.

use serde::{Deserialize, Serialize};

/// Contact fields collected at checkout, shared by every order line in a
/// batch and echoed to the payment processor on capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Full name.
    pub name: String,

    /// Email address.
    pub email: String,

    /// Phone number.
    pub phone: String,

    /// Delivery address.
    pub address: String,
}
