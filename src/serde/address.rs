//! Deserialize an [`Address`] from a hex string or an integer.
//!
//! YAML reads an unquoted `0x0000000000000000000000000000000000000001` as the integer `1`.

use alloy::primitives::{Address, U160};
use serde::{
    Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};
use std::fmt;

/// Serializes `address` as a checksummed hex string.
pub fn serialize<S>(address: &Address, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    address.serialize(serializer)
}

/// Deserializes an [`Address`] from a hex string or an unsigned integer.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    struct AddressVisitor;

    impl Visitor<'_> for AddressVisitor {
        type Value = Address;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a hex encoded address")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Address, E> {
            value.parse().map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Address, E> {
            Ok(Address::from(U160::from(value)))
        }

        fn visit_u128<E: de::Error>(self, value: u128) -> Result<Address, E> {
            Ok(Address::from(U160::from(value)))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Address, E> {
            match u64::try_from(value) {
                Ok(value) => self.visit_u64(value),
                Err(_) => Err(E::invalid_value(de::Unexpected::Signed(value), &self)),
            }
        }
    }

    deserializer.deserialize_any(AddressVisitor)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, address};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        address: Address,
    }

    #[test]
    fn accepts_yaml_integers() {
        let holder: Holder =
            serde_yaml::from_str("address: 0x0000000000000000000000000000000000000001").unwrap();
        assert_eq!(holder.address, address!("0000000000000000000000000000000000000001"));

        let holder: Holder =
            serde_yaml::from_str("address: 0x0000000000000000000000000000000000000000").unwrap();
        assert_eq!(holder.address, Address::ZERO);

        assert!(serde_yaml::from_str::<Holder>("address: -1").is_err());
    }

    #[test]
    fn accepts_hex_strings() {
        let holder: Holder =
            serde_yaml::from_str("address: 0xcA11bde05977b3631167028862bE2a173976CA11").unwrap();
        assert_eq!(holder.address, address!("cA11bde05977b3631167028862bE2a173976CA11"));

        let holder: Holder =
            serde_yaml::from_str("address: \"0x00000000000000000000000000000000000000ff\"")
                .unwrap();
        assert_eq!(holder.address, Address::with_last_byte(0xff));

        let yaml = serde_yaml::to_string(&holder).unwrap();
        assert_eq!(serde_yaml::from_str::<Holder>(&yaml).unwrap(), holder);
    }
}
