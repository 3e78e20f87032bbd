use crate::application::engine::DeliveryView;
use crate::domain::business::Business;
use crate::domain::rider::Rider;
use crate::error::Result;
use std::io::Write;

/// Writes the final platform state as CSV, one `kind` column telling the row
/// types apart so a whole run fits in a single stream.
pub struct StateWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StateWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().flexible(true).from_writer(sink),
        }
    }

    pub fn write_state(
        mut self,
        businesses: &[Business],
        riders: &[Rider],
        deliveries: &[DeliveryView],
    ) -> Result<()> {
        self.writer
            .write_record(["kind", "name", "a", "b", "c", "d"])?;
        for business in businesses {
            self.writer.write_record([
                "business",
                &business.name,
                &business.subscription_tier.to_string(),
                &business.rides_used.to_string(),
                &business.rides_total.to_string(),
                &business.wallet_balance.to_string(),
            ])?;
        }
        for rider in riders {
            self.writer.write_record([
                "rider",
                &rider.name,
                &rider.status.to_string(),
                &rider.total_deliveries.to_string(),
                &rider.earnings_this_month.to_string(),
                "",
            ])?;
        }
        for view in deliveries {
            self.writer.write_record([
                "delivery",
                view.business_name.as_deref().unwrap_or("-"),
                view.rider_name.as_deref().unwrap_or("-"),
                &view.delivery.status.to_string(),
                &view.delivery.price.to_string(),
                &view.delivery.rider_commission.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::business::SubscriptionTier;
    use crate::domain::ids::UserId;
    use chrono::Utc;

    #[test]
    fn test_writes_one_row_per_record() {
        let business = Business::new(
            UserId::generate(),
            "Pharmacie Centrale".into(),
            SubscriptionTier::Monthly,
            Utc::now(),
        );
        let rider = Rider::new(UserId::generate(), "Ahmed".into(), "+212".into(), Utc::now());

        let mut out = Vec::new();
        StateWriter::new(&mut out)
            .write_state(&[business], &[rider], &[])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("business,Pharmacie Centrale,monthly,0,8,0"));
        assert!(text.contains("rider,Ahmed,offline,0,0,"));
    }
}
