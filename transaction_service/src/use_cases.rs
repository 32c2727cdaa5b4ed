pub mod replicated_writer;
