//! gRPC `LibraryService` trait implementation.
//!
//! Thin handlers that build the request logger, extract credentials and
//! delegate to the domain methods.

use library_core::{ErrorExt, ValidateExt, bearer_value};
use library_proto::library::library_service_server::LibraryService as LibraryServiceTrait;
use library_proto::library::{
    AddBookRequest, AllBooksRequest, Book, BookId, BookList, LoginRequest, LoginResponse,
    RegistrationRequest, UpdateBookRequest, User,
};
use tonic::metadata::{Ascii, MetadataValue};
use tonic::{Request, Response, Status};
use tracing::instrument;

use super::{BookInput, BookUpdate, LibraryService};
use crate::middleware::{ClientIp, RequestLogger};
use crate::services::Credentials;

fn to_proto(book: library_db::Book) -> Book {
    Book {
        id: book.id,
        title: book.title,
        year: book.year,
        user_id: book.user_id,
    }
}

#[tonic::async_trait]
impl LibraryServiceTrait for LibraryService {
    #[instrument(skip(self, request), fields(user_id))]
    async fn add_book(&self, request: Request<AddBookRequest>) -> Result<Response<Book>, Status> {
        let log = RequestLogger::from_grpc(&request, "AddBook");
        let input = BookInput {
            title: request.get_ref().title.clone(),
            year: request.get_ref().year,
        };
        input.validate()?;

        let owner = self.sessions().authenticate(&request).await?;
        tracing::Span::current().record("user_id", owner);
        let book = self.add_book(&log, &input, Some(owner)).await?;
        Ok(Response::new(to_proto(book)))
    }

    #[instrument(skip(self, request))]
    async fn get_book(&self, request: Request<BookId>) -> Result<Response<Book>, Status> {
        let log = RequestLogger::from_grpc(&request, "GetBook");
        let book = self.get_book(&log, request.get_ref().id).await?;
        Ok(Response::new(to_proto(book)))
    }

    #[instrument(skip(self, request))]
    async fn delete_book(&self, request: Request<BookId>) -> Result<Response<()>, Status> {
        let log = RequestLogger::from_grpc(&request, "DeleteBook");
        self.delete_book(&log, request.get_ref().id).await?;
        Ok(Response::new(()))
    }

    #[instrument(skip(self, request))]
    async fn update_book(
        &self,
        request: Request<UpdateBookRequest>,
    ) -> Result<Response<()>, Status> {
        let log = RequestLogger::from_grpc(&request, "UpdateBook");
        let req = request.into_inner();
        let update = BookUpdate {
            id: req.id,
            title: req.title,
            year: req.year,
        };
        self.update_book(&log, &update).await?;
        Ok(Response::new(()))
    }

    #[instrument(skip(self, request))]
    async fn all_books(
        &self,
        request: Request<AllBooksRequest>,
    ) -> Result<Response<BookList>, Status> {
        let log = RequestLogger::from_grpc(&request, "AllBooks");
        let books = self.all_books(&log, request.get_ref().limit).await?;
        Ok(Response::new(BookList {
            books: books.into_iter().map(to_proto).collect(),
        }))
    }

    #[instrument(skip(self, request))]
    async fn registration(
        &self,
        request: Request<RegistrationRequest>,
    ) -> Result<Response<User>, Status> {
        let log = RequestLogger::from_grpc(&request, "Registration");
        let req = request.into_inner();
        let credentials = Credentials {
            email: req.email,
            password: req.password,
        };
        let user = self.sessions().register(&log, &credentials).await?;
        Ok(Response::new(User {
            id: user.id,
            email: user.email,
        }))
    }

    #[instrument(skip(self, request), fields(user_id))]
    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<LoginResponse>, Status> {
        let log = RequestLogger::from_grpc(&request, "Login");
        let origin = ClientIp::from_grpc(&request);

        let req = request.into_inner();
        let credentials = Credentials {
            email: req.email,
            password: req.password,
        };
        let outcome = self.sessions().login(&log, &credentials, origin).await?;
        tracing::Span::current().record("user_id", outcome.user_id);

        let authorization: MetadataValue<Ascii> = bearer_value(&outcome.token)
            .parse()
            .internal("Failed to encode session token")?;

        let mut response = Response::new(LoginResponse {
            user_id: outcome.user_id,
        });
        response.metadata_mut().insert("authorization", authorization);
        Ok(response)
    }
}
