// SPDX-License-Identifier: MIT

//! Payment handoff: constructs a provider deep link for the OS/browser
//! to open. No callback, no confirmation of completion.

/// Build a UPI payment deep link for a recipient's payment handle.
pub fn payment_link(handle: &str, payee_name: &str, amount: f64, note: &str) -> String {
    format!(
        "upi://pay?pa={}&pn={}&am={:.2}&tn={}&cu=INR",
        urlencoding::encode(handle),
        urlencoding::encode(payee_name),
        amount,
        urlencoding::encode(note),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_encodes_all_components() {
        let link = payment_link("asha@upi", "Asha Rao", 120.5, "cab split");
        assert_eq!(
            link,
            "upi://pay?pa=asha%40upi&pn=Asha%20Rao&am=120.50&tn=cab%20split&cu=INR"
        );
    }
}
