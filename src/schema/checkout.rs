use crate::schema::{SchemaRegistry, StepDefinition};
use crate::validation::validators::{digits, email, expiry_date, required};

pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";
pub const EMAIL: &str = "email";
pub const ADDRESS: &str = "address";
pub const CITY: &str = "city";
pub const POSTAL_CODE: &str = "postalCode";
pub const CARD_NUMBER: &str = "cardNumber";
pub const EXPIRY_DATE: &str = "expiryDate";
pub const CVV: &str = "cvv";

pub fn personal_details() -> StepDefinition {
    StepDefinition::builder("personal", "Personal Details")
        .rules(FIRST_NAME, "First name", [required("First name is required")])
        .rules(LAST_NAME, "Last name", [required("Last name is required")])
        .rules(
            EMAIL,
            "Email",
            [required("Email is required"), email("Invalid email address")],
        )
        .build()
}

pub fn address_details() -> StepDefinition {
    StepDefinition::builder("address", "Address Details")
        .rules(ADDRESS, "Address", [required("Address is required")])
        .rules(CITY, "City", [required("City is required")])
        .rules(
            POSTAL_CODE,
            "Postal code",
            [
                required("Postal code is required"),
                digits(&[5, 6], "Postal code must be 5 or 6 digits"),
            ],
        )
        .build()
}

pub fn payment_details() -> StepDefinition {
    StepDefinition::builder("payment", "Payment Details")
        .rules(
            CARD_NUMBER,
            "Card number",
            [
                required("Card number is required"),
                digits(&[16], "Card number must be 16 digits"),
            ],
        )
        .rules(
            EXPIRY_DATE,
            "Expiry date",
            [
                required("Expiry date is required"),
                expiry_date("Expiry date must be in MM/YY format", "Card has expired"),
            ],
        )
        .rules(
            CVV,
            "CVV",
            [
                required("CVV is required"),
                digits(&[3, 4], "CVV must be 3 or 4 digits"),
            ],
        )
        .build()
}

impl SchemaRegistry {
    /// Personal, address and payment steps, in that order.
    pub fn checkout() -> Self {
        Self::new(vec![personal_details(), address_details(), payment_details()])
            .expect("checkout steps are well-formed")
    }
}
