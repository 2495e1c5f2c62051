#![allow(unused)]
use anyhow::Result;
use api::*;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::client::Client;

mod api;
mod client;

#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    url: String,
}
#[derive(Subcommand)]
enum Commands {
    CreatePrediction {
        #[arg(short, long)]
        question: String,
        #[arg(short, long)]
        category: String,
        #[arg(short, long)]
        expiry_time: String,
    },
    ListPredictions {
        #[arg(short, long)]
        category: Option<String>,
    },
    SubmitOpinion {
        #[arg(short, long)]
        prediction: String,
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        opinion: Stance,
        #[arg(short, long)]
        amount: Decimal,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Args::parse();
    let client = Client::new(cli.url);

    match cli.command {
        Commands::CreatePrediction {
            question,
            category,
            expiry_time,
        } => {
            let response = client
                .create_prediction(&NewPredictionRequest {
                    question,
                    category,
                    expiry_time,
                })
                .await;
            println!("{}: {}", response.status(), response.text().await?);
        }
        Commands::ListPredictions { category } => {
            let listed = client.get_predictions(category.as_deref()).await?;
            for prediction in listed.predictions {
                println!(
                    "{} [{}] {} (expires {})",
                    prediction.id, prediction.category, prediction.question, prediction.expiry_time
                );
            }
        }
        Commands::SubmitOpinion {
            prediction,
            user,
            opinion,
            amount,
        } => {
            let response = client
                .submit_opinion(&NewOpinionRequest {
                    prediction_id: prediction,
                    user_id: user,
                    opinion,
                    amount,
                })
                .await;
            println!("{}: {}", response.status(), response.text().await?);
        }
    }
    Ok(())
}
