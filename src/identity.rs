// This file is part of bracketeer.
//
// bracketeer is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// bracketeer is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use serde::{Deserialize, Serialize};

use crate::normalize::sanitize_name;

pub const DISPLAY_NAME_MAX: usize = 24;
const FALLBACK_NAME: &str = "Player";

/// The authenticated user, as reported by the identity provider.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Identity {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn new(uid: &str, email: Option<&str>) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.map(str::to_string),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        display_name_from_email(self.email.as_deref())
    }
}

/// The local part of an email address, sanitized and cut to
/// [`DISPLAY_NAME_MAX`] characters.
#[must_use]
pub fn display_name_from_email(email: Option<&str>) -> String {
    let email = email.filter(|email| !email.is_empty()).unwrap_or(FALLBACK_NAME);
    let local = email.split('@').next().unwrap_or_default();
    let name: String = sanitize_name(local).chars().take(DISPLAY_NAME_MAX).collect();
    let name = name.trim_end().to_string();

    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}
