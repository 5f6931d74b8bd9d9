use anyhow::Result;
use contracts::domain::a001_consumer::aggregate::Consumer;

/// Render the consumer list as CSV for the admin export download.
pub fn consumers_to_csv(consumers: &[Consumer]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    writer.write_record([
        "Consumer Number",
        "Name",
        "Email",
        "Phone",
        "Address",
        "Status",
        "Registered At",
        "Assigned To",
        "Service Fee",
        "Payment Type",
        "Transaction ID",
        "Last Updated",
    ])?;

    for consumer in consumers {
        let (service_fee, payment_type, transaction_id) = match &consumer.payment {
            Some(p) => (
                p.service_fee.to_string(),
                p.payment_type.code().to_string(),
                p.transaction_id.clone().unwrap_or_default(),
            ),
            None => (String::new(), String::new(), String::new()),
        };

        writer.write_record([
            consumer.consumer_number.as_str(),
            consumer.name.as_str(),
            consumer.email.as_str(),
            consumer.phone.as_str(),
            consumer.address.as_str(),
            consumer.status.label(),
            &consumer.registered_at.to_rfc3339(),
            consumer.assigned_to.as_deref().unwrap_or(""),
            &service_fee,
            &payment_type,
            &transaction_id,
            &consumer.last_updated().to_rfc3339(),
        ])?;
    }

    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a001_consumer::aggregate::RegisterConsumerDto;

    #[test]
    fn test_csv_has_header_and_one_row_per_consumer() {
        let dto = RegisterConsumerDto {
            consumer_number: "100123456789".to_string(),
            name: "Test Consumer".to_string(),
            email: "test@example.com".to_string(),
            phone: "9876543210".to_string(),
            address: "Pune".to_string(),
            ..Default::default()
        };
        let consumer = Consumer::new_for_registration(dto, "agent-1".to_string());
        let csv_text = consumers_to_csv(&[consumer]).unwrap();

        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Consumer Number,Name"));
        assert!(lines[1].contains("Evaluation Pending"));
    }
}
