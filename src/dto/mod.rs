pub mod schedule_dto;
pub mod test_dto;
