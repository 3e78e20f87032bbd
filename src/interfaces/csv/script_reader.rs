use crate::domain::business::SubscriptionTier;
use crate::domain::delivery::PaymentMethod;
use crate::error::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One line of a dispatch scenario.
///
/// Scripts reference entities by the labels they were registered under, since
/// real record ids are generated at run time.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    /// `business,<label>,<tier>` — onboard a business.
    RegisterBusiness {
        label: String,
        tier: SubscriptionTier,
    },
    /// `rider,<label>` — onboard a rider (starts offline).
    RegisterRider { label: String },
    /// `online,<rider>` / `offline,<rider>`.
    SetOnline { rider: String, online: bool },
    /// `request,<label>,<business>,<method>` — request a delivery and label
    /// the result.
    Request {
        label: String,
        business: String,
        method: PaymentMethod,
    },
    /// `accept,<delivery>,<rider>` — explicit rider accept.
    Accept { delivery: String, rider: String },
    /// `pickup,<delivery>`.
    Pickup { delivery: String },
    /// `transit,<delivery>`.
    Transit { delivery: String },
    /// `deliver,<delivery>`.
    Deliver { delivery: String },
    /// `cancel,<delivery>`.
    Cancel { delivery: String },
    /// `topup,<business>,<amount>`.
    TopUp { business: String, amount: Decimal },
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    op: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    target: String,
    #[serde(default)]
    arg: String,
}

impl RawCommand {
    fn require(&self, field: &str, value: &str) -> Result<String> {
        if value.is_empty() {
            Err(Error::Validation(format!(
                "op {} requires a {field} column",
                self.op
            )))
        } else {
            Ok(value.to_string())
        }
    }

    fn into_command(self) -> Result<ScriptCommand> {
        match self.op.as_str() {
            "business" => Ok(ScriptCommand::RegisterBusiness {
                label: self.require("label", &self.label)?,
                tier: self.require("target", &self.target)?.parse()?,
            }),
            "rider" => Ok(ScriptCommand::RegisterRider {
                label: self.require("label", &self.label)?,
            }),
            "online" => Ok(ScriptCommand::SetOnline {
                rider: self.require("label", &self.label)?,
                online: true,
            }),
            "offline" => Ok(ScriptCommand::SetOnline {
                rider: self.require("label", &self.label)?,
                online: false,
            }),
            "request" => Ok(ScriptCommand::Request {
                label: self.require("label", &self.label)?,
                business: self.require("target", &self.target)?,
                method: self.require("arg", &self.arg)?.parse()?,
            }),
            "accept" => Ok(ScriptCommand::Accept {
                delivery: self.require("label", &self.label)?,
                rider: self.require("target", &self.target)?,
            }),
            "pickup" => Ok(ScriptCommand::Pickup {
                delivery: self.require("label", &self.label)?,
            }),
            "transit" => Ok(ScriptCommand::Transit {
                delivery: self.require("label", &self.label)?,
            }),
            "deliver" => Ok(ScriptCommand::Deliver {
                delivery: self.require("label", &self.label)?,
            }),
            "cancel" => Ok(ScriptCommand::Cancel {
                delivery: self.require("label", &self.label)?,
            }),
            "topup" => {
                let amount: Decimal = self
                    .require("arg", &self.arg)?
                    .parse()
                    .map_err(|_| Error::Validation(format!("bad top-up amount: {}", self.arg)))?;
                Ok(ScriptCommand::TopUp {
                    business: self.require("label", &self.label)?,
                    amount,
                })
            }
            other => Err(Error::Validation(format!("unknown op: {other}"))),
        }
    }
}

/// Streams scenario commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding one `Result<ScriptCommand>` per row so a malformed line does not
/// abort the whole run.
pub struct ScriptReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ScriptReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<ScriptCommand>> {
        self.reader.into_deserialize().map(|row| {
            row.map_err(Error::from)
                .and_then(RawCommand::into_command)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_script() {
        let data = "op, label, target, arg\n\
                    business, pharmacy, monthly, \n\
                    rider, ahmed, , \n\
                    online, ahmed, , \n\
                    request, del1, pharmacy, subscription\n\
                    topup, pharmacy, , 150";
        let commands: Vec<_> = ScriptReader::new(data.as_bytes()).commands().collect();

        assert_eq!(commands.len(), 5);
        assert_eq!(
            *commands[0].as_ref().unwrap(),
            ScriptCommand::RegisterBusiness {
                label: "pharmacy".into(),
                tier: SubscriptionTier::Monthly,
            }
        );
        assert_eq!(
            *commands[3].as_ref().unwrap(),
            ScriptCommand::Request {
                label: "del1".into(),
                business: "pharmacy".into(),
                method: PaymentMethod::Subscription,
            }
        );
        assert_eq!(
            *commands[4].as_ref().unwrap(),
            ScriptCommand::TopUp {
                business: "pharmacy".into(),
                amount: dec!(150),
            }
        );
    }

    #[test]
    fn test_reader_unknown_op_is_an_error() {
        let data = "op, label, target, arg\nteleport, del1, , ";
        let commands: Vec<_> = ScriptReader::new(data.as_bytes()).commands().collect();
        assert!(matches!(commands[0], Err(Error::Validation(_))));
    }

    #[test]
    fn test_reader_missing_column_is_an_error() {
        let data = "op, label, target, arg\nrequest, del1, , wallet";
        let commands: Vec<_> = ScriptReader::new(data.as_bytes()).commands().collect();
        assert!(matches!(commands[0], Err(Error::Validation(_))));
    }

    #[test]
    fn test_reader_keeps_going_past_a_bad_row() {
        let data = "op, label, target, arg\n\
                    teleport, x, , \n\
                    rider, ahmed, , ";
        let commands: Vec<_> = ScriptReader::new(data.as_bytes()).commands().collect();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].is_err());
        assert!(commands[1].is_ok());
    }
}
