tonic::include_proto!("wallet");
