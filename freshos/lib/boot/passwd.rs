use std::{collections::BTreeMap, path::Path};

use crate::FreshosResult;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Longest uid or gid field accepted, in characters.
const MAX_ID_LENGTH: usize = 10;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Ownership of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Account {
    /// User id.
    pub uid: u32,

    /// Primary group id, when it is a plain number.
    pub gid: Option<u32>,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Parses `user:password:uid:gid:...` records.
///
/// Records with fewer than four fields, with an overlong uid or gid, or with a non-numeric uid
/// are skipped. A non-numeric gid is recorded as absent. Ids that fit in ten digits but not in
/// 32 bits are rejected with a warning: the uid skips the record and the gid counts as absent.
/// A repeated user name keeps the last record.
pub fn parse_passwd(data: &str) -> BTreeMap<String, Account> {
    let mut accounts = BTreeMap::new();
    for line in data.lines() {
        let fields: Vec<&str> = line.splitn(5, ':').collect();
        let [user, _, uid, gid, ..] = fields.as_slice() else {
            continue;
        };

        if uid.len() > MAX_ID_LENGTH || gid.len() > MAX_ID_LENGTH {
            continue;
        }

        let Some(uid) = parse_id(user, "uid", uid) else {
            continue;
        };

        let gid = parse_id(user, "gid", gid);
        accounts.insert(user.to_string(), Account { uid, gid });
    }

    accounts
}

fn parse_id(user: &str, field: &str, value: &str) -> Option<u32> {
    let id = value.trim().parse::<u64>().ok()?;
    match u32::try_from(id) {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::warn!("{} {} of {} is out of range", field, id, user);
            None
        }
    }
}

/// Reads and parses a passwd file.
pub fn read_passwd(path: impl AsRef<Path>) -> FreshosResult<BTreeMap<String, Account>> {
    let data = std::fs::read_to_string(path)?;
    Ok(parse_passwd(&data))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_passwd() {
        let accounts = parse_passwd(
            "root:x:0:0:root:/root:/bin/bash\n\
             alice:x:1000:1000:Alice,,,:/home/alice:/bin/bash\n\
             bob:x:1001:staff:Bob:/home/bob:/bin/sh\n\
             broken:x:abc:100:::\n\
             short:x:12\n\
             huge:x:12345678901:1:::\n\
             minimal:x:1002:1002\n",
        );

        assert_eq!(accounts.len(), 4);
        assert_eq!(accounts["root"], Account { uid: 0, gid: Some(0) });
        assert_eq!(
            accounts["alice"],
            Account {
                uid: 1000,
                gid: Some(1000)
            }
        );
        assert_eq!(accounts["bob"], Account { uid: 1001, gid: None });
        assert_eq!(
            accounts["minimal"],
            Account {
                uid: 1002,
                gid: Some(1002)
            }
        );
    }

    #[test_log::test]
    fn test_parse_passwd_rejects_ids_beyond_32_bits() {
        let accounts = parse_passwd(
            "wide:x:4294967296:100:::\n\
             widegroup:x:1003:4294967296:::\n\
             edge:x:4294967295:4294967295:::\n",
        );

        assert_eq!(accounts.len(), 2);
        assert!(!accounts.contains_key("wide"));
        assert_eq!(accounts["widegroup"], Account { uid: 1003, gid: None });
        assert_eq!(
            accounts["edge"],
            Account {
                uid: u32::MAX,
                gid: Some(u32::MAX)
            }
        );
    }

    #[test]
    fn test_accounts_order_by_uid_then_gid() {
        let mut accounts = vec![
            Account { uid: 1001, gid: Some(5) },
            Account { uid: 1000, gid: Some(1000) },
            Account { uid: 1000, gid: None },
        ];
        accounts.sort();
        assert_eq!(accounts[0], Account { uid: 1000, gid: None });
    }
}
