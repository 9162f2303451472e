//! DTO to model mappers

use super::dto::{ApiMessage, SettingItem, ZoneDto, ZoneSettingDto};
use crate::contract::{Setting, TargetDetails};

impl From<ZoneSettingDto> for Setting {
    fn from(dto: ZoneSettingDto) -> Self {
        Self {
            id: dto.id,
            value: dto.value,
            editable: dto.editable,
        }
    }
}

impl<'a> From<&'a Setting> for SettingItem<'a> {
    fn from(setting: &'a Setting) -> Self {
        Self {
            id: &setting.id,
            value: &setting.value,
        }
    }
}

impl From<ZoneDto> for TargetDetails {
    fn from(dto: ZoneDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            status: dto.status,
            kind: dto.kind,
        }
    }
}

/// Join API error messages into one line
pub fn join_messages(errors: &[ApiMessage]) -> String {
    errors
        .iter()
        .map(|e| match e.code {
            Some(code) => format!("{} ({})", e.message, code),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
