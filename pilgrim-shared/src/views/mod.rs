pub mod position_view;
