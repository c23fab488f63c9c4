pub mod still_encoder;
