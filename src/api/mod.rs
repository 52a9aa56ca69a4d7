pub mod settings_dto;
